use ratechart::config::MissingValuePolicy;
use ratechart::data::{build, date_to_ms, parse_month, Dataset, ParseOptions, RawRow, RawTable};
use ratechart::locator;
use ratechart::dimension::DimensionKey;
use ratechart::ChartError;

fn headers(months: &[&str]) -> Vec<String> {
    let mut h = vec!["".to_string(), "Age".to_string(), "Gender".to_string(), "Race".to_string()];
    h.extend(months.iter().map(|m| m.to_string()));
    h
}

fn row(h: &[String], cells: &[&str]) -> RawRow {
    RawRow::from_pairs(h.iter().cloned().zip(cells.iter().map(|c| c.to_string())))
}

#[test]
fn one_series_per_row_with_aligned_values() {
    let h = headers(&["Jan-20", "Feb-20", "Mar-20", "Apr-20"]);
    let rows = vec![
        row(&h, &["0", "All ages", "All genders", "All races", "3.6", "3.5", "4.4", "14.7"]),
        row(&h, &["1", "16 to 24 years", "Women", "Asian", "6.1", "5.9", "7.5", "31.9"]),
        row(&h, &["2", "55 years and over", "Men", "White", "2.7", "2.6", "3.3", "13.0"]),
    ];

    let (series, axis) = build(&rows, &h[1..4], &h[4..], &ParseOptions::default()).unwrap();

    assert_eq!(series.len(), rows.len());
    assert_eq!(axis.len(), 4);
    for (i, s) in series.iter().enumerate() {
        assert_eq!(s.id, i);
        assert_eq!(s.values.len(), axis.len());
    }
    assert!(axis.is_sorted());
}

#[test]
fn name_is_built_from_the_same_properties() {
    let h = headers(&["Jan-20"]);
    let rows = vec![row(&h, &["0", "25 to 54 years", "Men", "Hispanic or Latino", "4.0"])];
    let (series, _) = build(&rows, &h[1..4], &h[4..], &ParseOptions::default()).unwrap();

    let s = &series[0];
    let rebuilt = format!(
        "The unemployment rate for {}, {}, {}",
        s.property(DimensionKey::Age).unwrap(),
        s.property(DimensionKey::Gender).unwrap(),
        s.property(DimensionKey::Race).unwrap()
    );
    assert_eq!(s.name, rebuilt);
}

#[test]
fn dimension_columns_can_come_in_any_order() {
    let text = ",RACE,age,Gender,May-20\n0,White,All ages,Women,12.0\n";
    let ds = Dataset::from_csv_str(text, &ParseOptions::default()).unwrap();
    let s = &ds.series[0];
    assert_eq!(s.property(DimensionKey::Race), Some("White"));
    assert_eq!(s.property(DimensionKey::Age), Some("All ages"));
    assert_eq!(s.name, "The unemployment rate for White, All ages, Women");
}

#[test]
fn bad_month_header_is_a_parse_error() {
    let text = ",age,gender,race,2020-01\n0,All ages,All genders,All races,3.6\n";
    match Dataset::from_csv_str(text, &ParseOptions::default()) {
        Err(ChartError::Parse { column, .. }) => assert_eq!(column, "2020-01"),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn too_few_columns_is_a_schema_error() {
    let table = RawTable::from_csv_str(",age,gender\n0,All ages,Men\n").unwrap();
    assert!(matches!(table.value_columns(), Err(ChartError::Schema(_))));
}

#[test]
fn nan_policy_applies_to_every_bad_cell() {
    let text = ",age,gender,race,Jan-20,Feb-20\n\
                0,All ages,All genders,All races,,x\n\
                1,All ages,All genders,White,1.0,2.0\n";
    let opts = ParseOptions {
        policy: MissingValuePolicy::Nan,
        ..ParseOptions::default()
    };
    let ds = Dataset::from_csv_str(text, &opts).unwrap();
    assert!(ds.series[0].values.iter().all(|v| v.is_nan()));
    assert_eq!(ds.series[1].values, vec![1.0, 2.0]);
    assert_eq!(ds.max_value(), 2.0);

    let strict = Dataset::from_csv_str(text, &ParseOptions::default());
    assert!(matches!(strict, Err(ChartError::Parse { row: 0, .. })));
}

#[test]
fn months_out_of_order_are_rejected() {
    let text = ",age,gender,race,Mar-20,Feb-20,Jan-20\n\
                0,All ages,All genders,All races,30,20,10\n\
                1,All ages,All genders,White,11,21,9\n";
    match Dataset::from_csv_str(text, &ParseOptions::default()) {
        Err(ChartError::Parse { column, .. }) => assert_eq!(column, "Feb-20"),
        other => panic!("expected parse error, got {:?}", other),
    }

    // Same rows in calendar order: Jan-20 at value 10 is series 0 exactly.
    let sorted = ",age,gender,race,Jan-20,Feb-20,Mar-20\n\
                  0,All ages,All genders,All races,10,20,30\n\
                  1,All ages,All genders,White,9,21,11\n";
    let ds = Dataset::from_csv_str(sorted, &ParseOptions::default()).unwrap();
    let jan = date_to_ms(parse_month("Jan-20").unwrap());
    assert_eq!(locator::nearest_index(&ds.dates, jan), Some(0));
    let all: Vec<_> = ds.series.iter().collect();
    assert_eq!(locator::locate(jan, 10.0, &all, &ds.dates).map(|s| s.id), Some(0));
}

#[test]
fn repeated_month_column_is_rejected() {
    let text = ",age,gender,race,Jan-20,Jan-20\n0,All ages,All genders,All races,1.0,2.0\n";
    assert!(matches!(
        RawTable::from_csv_str(text),
        Err(ChartError::Schema(_))
    ));

    // Rows assembled by hand skip the header check; the axis check still catches it.
    let h = headers(&["Jan-20", "Jan-20"]);
    let rows = vec![row(&h, &["0", "All ages", "All genders", "All races", "1.0", "2.0"])];
    assert!(build(&rows, &h[1..4], &h[4..], &ParseOptions::default()).is_err());
}
