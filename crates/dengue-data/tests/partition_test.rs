//! End-to-end partitioning of a weekly export.

use chrono::{Days, NaiveDate};
use dengue_data::{
    CsvSource, DataSource, Partitioner, RESPONSE_ACTUAL, SqliteSource, YearWeek, column_f64,
};
use dengue_model::TimeWindow;
use rusqlite::Connection;
use std::fmt::Write as _;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Weeks 2021-W01 through 2024-W10, cases equal to the row index.
fn weekly_rows() -> Vec<(YearWeek, i64)> {
    let mut rows = Vec::new();
    let mut monday = date(2021, 1, 4);
    let mut cases = 0;
    while monday < date(2024, 3, 11) {
        rows.push((YearWeek::from_date(monday), cases));
        monday = monday + Days::new(7);
        cases += 1;
    }
    rows
}

fn write_csv(dir: &TempDir) -> std::path::PathBuf {
    let mut body = String::from("year,eweek,cases,population\n");
    for (week, cases) in weekly_rows() {
        writeln!(body, "{},{},{},250000", week.year(), week.week(), cases).unwrap();
    }
    let path = dir.path().join("inla_model_ds.csv");
    std::fs::write(&path, body).unwrap();
    path
}

fn partitioner() -> Partitioner {
    Partitioner::new(
        &TimeWindow::new(date(2020, 1, 1), date(2022, 12, 31)),
        &TimeWindow::new(date(2023, 1, 1), date(2023, 12, 31)),
    )
}

#[test]
fn test_2023_weeks_masked_from_csv() {
    let dir = TempDir::new().unwrap();
    let source = CsvSource::new(write_csv(&dir));
    let dataset = source.load("national_analysis.inla_model_ds").unwrap();
    let rows = dataset.height();

    let partitioned = partitioner().partition(dataset, "cases").unwrap();
    assert_eq!(partitioned.height(), rows);
    assert_eq!(partitioned.masked_rows(), 52);

    let frame = partitioned.frame();
    let keys = column_f64(frame, "year_week_key").unwrap();
    let cases = column_f64(frame, "cases").unwrap();
    let actual = column_f64(frame, RESPONSE_ACTUAL).unwrap();

    for ((key, masked), original) in keys.iter().zip(&cases).zip(&actual) {
        let key = key.unwrap() as i64;
        assert!(original.is_some(), "{key} lost its actual value");
        if (202301..=202352).contains(&key) {
            assert!(masked.is_none(), "{key} should be masked");
        } else {
            assert_eq!(masked, original, "{key} should keep its value");
        }
    }

    let week_202152 = keys
        .iter()
        .position(|k| *k == Some(202152.0))
        .unwrap();
    assert!(cases[week_202152].is_some());
}

#[test]
fn test_sqlite_source_matches_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dengue.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE inla_model_ds (year INTEGER, eweek INTEGER, cases INTEGER)",
            [],
        )
        .unwrap();
        for (week, cases) in weekly_rows() {
            conn.execute(
                "INSERT INTO inla_model_ds VALUES (?1, ?2, ?3)",
                (week.year(), week.week(), cases),
            )
            .unwrap();
        }
    }

    let from_db = SqliteSource::open(&path)
        .unwrap()
        .load("inla_model_ds")
        .unwrap();
    let from_csv = CsvSource::new(write_csv(&dir))
        .load("inla_model_ds")
        .unwrap();

    let masked_db = partitioner().partition(from_db, "cases").unwrap();
    let masked_csv = partitioner().partition(from_csv, "cases").unwrap();
    assert_eq!(masked_db.test_mask(), masked_csv.test_mask());
    assert_eq!(
        column_f64(masked_db.frame(), "cases").unwrap(),
        column_f64(masked_csv.frame(), "cases").unwrap()
    );
}
