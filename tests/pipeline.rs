//! End-to-end pipeline tests: counts, ordering, idempotence, failure modes.

use anyhow::Result;
use phonesift::testing::{sample_phone_book, temp_phone_book, SamplePhoneRow};
use phonesift::{
    MalformedInputError, PartitionSink, PhonePipeline, PipelineOptions, RecordReader, RunState,
    Summary,
};
use std::path::{Path, PathBuf};

struct Run {
    summary: Summary,
    valid_path: PathBuf,
    invalid_path: PathBuf,
}

fn run_on(input: &Path, dir: &Path, options: PipelineOptions) -> Result<Run> {
    let valid_path = dir.join("valid_numbers.csv");
    let invalid_path = dir.join("invalid_numbers.csv");
    let reader = RecordReader::from_path(input)?;
    let valid = PartitionSink::create(&valid_path)?;
    let invalid = PartitionSink::create(&invalid_path)?;
    let summary = PhonePipeline::new(options).run(reader, valid, invalid)?;
    Ok(Run {
        summary,
        valid_path,
        invalid_path,
    })
}

#[test]
fn two_row_scenario_partitions_and_counts() -> Result<()> {
    // id=1 valid (0-prefix, second digit 8, 8 more digits); id=2 too short
    let rows = vec![
        SamplePhoneRow::new("1", "0821234567"),
        SamplePhoneRow::new("2", "123"),
    ];
    let (dir, input) = temp_phone_book(&rows)?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;

    assert_eq!(
        run.summary,
        Summary {
            count: 2,
            valid_count: 1,
            invalid_count: 1
        }
    );
    assert_eq!(std::fs::read_to_string(&run.valid_path)?, "1,0821234567\n");
    assert_eq!(std::fs::read_to_string(&run.invalid_path)?, "2,123\n");
    Ok(())
}

#[test]
fn country_prefix_form_lands_in_valid() -> Result<()> {
    let rows = vec![SamplePhoneRow::new("1", "27821234567")];
    let (dir, input) = temp_phone_book(&rows)?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;
    assert_eq!(run.summary.valid_count, 1);
    assert_eq!(std::fs::read_to_string(&run.valid_path)?, "1,27821234567\n");
    Ok(())
}

#[test]
fn counts_always_sum_to_total() -> Result<()> {
    let (dir, input) = temp_phone_book(&sample_phone_book())?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;
    assert_eq!(run.summary.count, 5);
    assert_eq!(
        run.summary.count,
        run.summary.valid_count + run.summary.invalid_count
    );
    assert_eq!(run.summary.valid_count, 3);
    assert_eq!(run.summary.invalid_count, 2);
    Ok(())
}

#[test]
fn per_partition_order_matches_input_order() -> Result<()> {
    let rows = vec![
        SamplePhoneRow::new("a", "0821234567"), // valid
        SamplePhoneRow::new("b", "bad"),        // invalid
        SamplePhoneRow::new("c", "27831234567"), // valid
        SamplePhoneRow::new("d", "999"),        // invalid
        SamplePhoneRow::new("e", "0711234567"), // valid
    ];
    let (dir, input) = temp_phone_book(&rows)?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;

    let valid_ids: Vec<String> = first_column(&run.valid_path)?;
    let invalid_ids: Vec<String> = first_column(&run.invalid_path)?;
    assert_eq!(valid_ids, ["a", "c", "e"]);
    assert_eq!(invalid_ids, ["b", "d"]);
    Ok(())
}

#[test]
fn rerun_is_idempotent() -> Result<()> {
    let (dir, input) = temp_phone_book(&sample_phone_book())?;
    let first = run_on(&input, dir.path(), PipelineOptions::default())?;
    let first_valid = std::fs::read_to_string(&first.valid_path)?;
    let first_invalid = std::fs::read_to_string(&first.invalid_path)?;

    let second = run_on(&input, dir.path(), PipelineOptions::default())?;
    assert_eq!(first.summary, second.summary);
    assert_eq!(first_valid, std::fs::read_to_string(&second.valid_path)?);
    assert_eq!(first_invalid, std::fs::read_to_string(&second.invalid_path)?);
    Ok(())
}

#[test]
fn header_only_input_yields_zero_summary() -> Result<()> {
    let (dir, input) = temp_phone_book(&[])?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;
    assert_eq!(
        run.summary,
        Summary {
            count: 0,
            valid_count: 0,
            invalid_count: 0
        }
    );
    Ok(())
}

#[test]
fn empty_input_yields_zero_summary() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("empty.csv");
    std::fs::write(&input, "")?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;
    assert_eq!(run.summary.count, 0);
    Ok(())
}

#[test]
fn whitespace_padded_number_is_valid_after_trim() -> Result<()> {
    let rows = vec![SamplePhoneRow::new("1", " 0821234567 ")];
    let (dir, input) = temp_phone_book(&rows)?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;
    assert_eq!(run.summary.valid_count, 1);
    // the normalized value, not the raw one, is persisted
    assert_eq!(std::fs::read_to_string(&run.valid_path)?, "1,0821234567\n");
    Ok(())
}

#[test]
fn wrong_leading_digit_is_invalid() -> Result<()> {
    let rows = vec![SamplePhoneRow::new("1", "2921234567")];
    let (dir, input) = temp_phone_book(&rows)?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;
    assert_eq!(run.summary.invalid_count, 1);
    Ok(())
}

#[test]
fn small_batches_process_everything() -> Result<()> {
    let (dir, input) = temp_phone_book(&sample_phone_book())?;
    let options = PipelineOptions {
        batch_rows: 2,
        ..PipelineOptions::default()
    };
    let run = run_on(&input, dir.path(), options)?;
    assert_eq!(run.summary.count, 5);
    assert_eq!(run.summary.valid_count, 3);
    Ok(())
}

#[test]
fn malformed_row_fails_run_with_no_summary() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("bad.csv");
    std::fs::write(&input, "id,phone_number\n1,0821234567\n2\n3,0831234567\n")?;

    let reader = RecordReader::from_path(&input)?;
    let valid = PartitionSink::create(dir.path().join("valid_numbers.csv"))?;
    let invalid = PartitionSink::create(dir.path().join("invalid_numbers.csv"))?;
    let mut pipeline = PhonePipeline::new(PipelineOptions::default());
    let err = pipeline.run(reader, valid, invalid).unwrap_err();

    assert_eq!(pipeline.state(), RunState::Failed);
    let malformed = err.downcast_ref::<MalformedInputError>().unwrap();
    assert_eq!(malformed.row, Some(2));
    Ok(())
}

#[test]
fn state_walks_idle_to_done() -> Result<()> {
    let (dir, input) = temp_phone_book(&sample_phone_book())?;
    let reader = RecordReader::from_path(&input)?;
    let valid = PartitionSink::create(dir.path().join("valid_numbers.csv"))?;
    let invalid = PartitionSink::create(dir.path().join("invalid_numbers.csv"))?;
    let mut pipeline = PhonePipeline::new(PipelineOptions::default());
    assert_eq!(pipeline.state(), RunState::Idle);
    pipeline.run(reader, valid, invalid)?;
    assert_eq!(pipeline.state(), RunState::Done);
    Ok(())
}

#[cfg(feature = "parallel")]
#[test]
fn cpu_derived_options_use_more_than_one_worker() {
    assert!(PipelineOptions::parallel().workers >= 2);
}

#[cfg(feature = "parallel")]
#[test]
fn wider_worker_pool_preserves_results_and_order() -> Result<()> {
    let rows: Vec<SamplePhoneRow> = (0..500)
        .map(|i| {
            let phone = if i % 3 == 0 {
                "0821234567".to_string()
            } else {
                format!("bad-{}", i)
            };
            SamplePhoneRow::new(i.to_string(), phone)
        })
        .collect();
    let (dir, input) = temp_phone_book(&rows)?;

    let seq_dir = dir.path().join("seq");
    let par_dir = dir.path().join("par");
    let seq = run_on(&input, &seq_dir, PipelineOptions::default())?;
    let par = run_on(
        &input,
        &par_dir,
        PipelineOptions {
            batch_rows: 64,
            workers: 4,
        },
    )?;

    assert_eq!(seq.summary, par.summary);
    assert_eq!(
        std::fs::read_to_string(&seq.valid_path)?,
        std::fs::read_to_string(&par.valid_path)?
    );
    assert_eq!(
        std::fs::read_to_string(&seq.invalid_path)?,
        std::fs::read_to_string(&par.invalid_path)?
    );
    Ok(())
}

#[test]
fn summary_serializes_to_response_payload() -> Result<()> {
    let (dir, input) = temp_phone_book(&sample_phone_book())?;
    let run = run_on(&input, dir.path(), PipelineOptions::default())?;
    assert_eq!(
        run.summary.to_json()?,
        r#"{"count":5,"validCount":3,"invalidCount":2}"#
    );
    Ok(())
}

fn first_column(path: &Path) -> Result<Vec<String>> {
    Ok(std::fs::read_to_string(path)?
        .lines()
        .map(|l| l.split(',').next().unwrap_or_default().to_string())
        .collect())
}
