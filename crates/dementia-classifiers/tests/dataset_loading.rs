use std::path::PathBuf;

use dementia_classifiers::config::DatasetConfig;
use dementia_classifiers::error::ClassifierError;
use dementia_classifiers::io::{read_dataset, read_table};
use dementia_classifiers::models::classifier_trait::ClassifierModel;
use dementia_classifiers::models::naive_bayes::GaussianNaiveBayes;
use dementia_classifiers::stats::evaluate;

fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

const TABLE: &str = "\
hesitations,pauses,word_count,retracing_reform,mlu,dementia
1.5,,120,,3.2,Y
0.5,2,180,1,4.1,N
2.5,,90,3,2.8,Y
";

#[test]
fn test_known_columns_and_label_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "train_set.csv", TABLE);

    let table = read_table(&path, b',').unwrap();
    let dataset = read_dataset(&path, &DatasetConfig::default()).unwrap();

    assert_eq!(dataset.n_features(), table.ncols() - 3);
    assert_eq!(dataset.feature_names, vec!["hesitations", "word_count", "mlu"]);
    assert_eq!(dataset.labels(), vec![1, 0, 1]);
    assert_eq!(dataset.class_counts(), (1, 2));
}

#[test]
fn test_tab_delimited_with_custom_labels() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "train_set.tsv", "f1\tf2\tgroup\n1\t2\tAD\n3\t4\tHC\n");
    let config = DatasetConfig {
        delimiter: '\t',
        label_column: "group".to_string(),
        positive_label: "AD".to_string(),
        negative_label: "HC".to_string(),
        drop_columns: vec![],
    };

    let dataset = read_dataset(&path, &config).unwrap();
    assert_eq!(dataset.n_features(), 2);
    assert_eq!(dataset.labels(), vec![1, 0]);
}

#[test]
fn test_missing_drop_column_names_the_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "train_set.csv", "hesitations,pauses,dementia\n1,2,Y\n");

    let err = read_dataset(&path, &DatasetConfig::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("retracing_reform"));
    assert!(matches!(
        err.downcast_ref::<ClassifierError>(),
        Some(ClassifierError::MissingColumn(name)) if name == "retracing_reform"
    ));
}

#[test]
fn test_non_numeric_feature_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "train_set.csv",
        "hesitations,pauses,retracing_reform,dementia\nmany,,,Y\n",
    );

    let err = read_dataset(&path, &DatasetConfig::default()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("hesitations"), "{}", message);
    assert!(message.contains("many"), "{}", message);
}

#[test]
fn test_missing_file_is_reported() {
    let err = read_table("/nonexistent/train_set.csv", b',').unwrap_err();
    assert!(err.to_string().contains("File not found"));
}

#[test]
fn test_ragged_row_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "train_set.csv", "a,b,dementia\n1,2,Y\n3,N\n");
    assert!(read_table(&path, b',').is_err());
}

#[test]
fn test_header_only_table_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "train_set.csv", "a,pauses,retracing_reform,dementia\n");
    let err = read_dataset(&path, &DatasetConfig::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ClassifierError>(),
        Some(ClassifierError::EmptyDataset)
    ));
}

const SWAPPED_TABLE: &str = "\
mlu,pauses,word_count,retracing_reform,hesitations,dementia
3.2,,120,,1.5,Y
4.1,2,180,1,0.5,N
2.8,,90,3,2.5,Y
";

#[test]
fn test_reordered_test_columns_are_aligned_to_training() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = write(&dir, "train_set.csv", TABLE);
    let test_path = write(&dir, "test_set.csv", SWAPPED_TABLE);
    let config = DatasetConfig::default();

    let train = read_dataset(&train_path, &config).unwrap();
    let test = read_dataset(&test_path, &config).unwrap();
    assert_ne!(test.x, train.x);

    let aligned = test.align_to(&train.feature_names).unwrap();
    assert_eq!(aligned.feature_names, train.feature_names);
    assert_eq!(aligned.x, train.x);
    assert_eq!(aligned.y, train.y);

    let mut model = GaussianNaiveBayes::default();
    model.fit(&train.x, &train.labels()).unwrap();
    let on_train = evaluate(&model, &train, "train").unwrap();
    let on_test = evaluate(&model, &aligned, "test").unwrap();
    assert_eq!(on_test.accuracy, on_train.accuracy);
    assert_eq!(on_test.confusion, on_train.confusion);
}

#[test]
fn test_substituted_test_column_names_the_missing_one() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = write(&dir, "train_set.csv", TABLE);
    let test_path = write(
        &dir,
        "test_set.csv",
        "hesitations,pauses,speech_rate,retracing_reform,mlu,dementia\n1.5,,2.0,,3.2,Y\n",
    );
    let config = DatasetConfig::default();

    let train = read_dataset(&train_path, &config).unwrap();
    let test = read_dataset(&test_path, &config).unwrap();
    assert_eq!(test.n_features(), train.n_features());

    let err = test.align_to(&train.feature_names).unwrap_err();
    assert!(matches!(err, ClassifierError::MissingColumn(ref name) if name == "word_count"));
    assert!(err.to_string().contains("word_count"));
}
