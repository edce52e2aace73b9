use paramtune::parameter::{FloatParam, IntParam, Parameter};
use paramtune::Study;

fn populated() -> Study {
    let study = Study::builder().name("export").maximize().create().unwrap();
    let x = FloatParam::new("x", 0.0, 1.0);
    let n = IntParam::new("n", 1, 3);

    let mut trial = study.ask().unwrap();
    x.suggest(&mut trial).unwrap();
    n.suggest(&mut trial).unwrap();
    trial.set_user_attr("note", "a,b");
    study.complete_trial(trial, 10.0).unwrap();

    let mut trial = study.ask().unwrap();
    x.suggest(&mut trial).unwrap();
    study.fail_trial(trial, "exit 1").unwrap();
    study
}

#[test]
fn test_csv_has_one_row_per_trial() {
    let study = populated();
    let mut buf = Vec::new();
    study.to_csv(&mut buf).unwrap();
    let csv = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "number,state,value,datetime_start,datetime_complete,duration_ms,\
         params_n,params_x,user_attrs_fail_reason,user_attrs_note"
    );
    assert!(lines[1].starts_with("0,COMPLETE,10,"));
    assert!(lines[1].ends_with(",\"a,b\""));
    assert!(lines[2].starts_with("1,FAIL,,"));
    assert!(lines[2].contains(",exit 1,"));
}

#[test]
fn test_json_contains_every_trial() {
    let study = populated();
    let mut buf = Vec::new();
    study.to_json(&mut buf).unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(doc["study_name"], "export");
    assert_eq!(doc["direction"], "Maximize");
    let trials = doc["trials"].as_array().unwrap();
    assert_eq!(trials.len(), 2);
    assert_eq!(trials[0]["value"], 10.0);
    assert_eq!(trials[1]["state"], "Failed");
}
