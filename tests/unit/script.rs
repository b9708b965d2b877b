use super::*;

const SCRIPT: &str = r##"{
  "background": "#ffffff",
  "costumes": {
    "box": { "kind": "solid", "width": 10, "height": 10, "color": "#00c800" }
  },
  "sprites": [
    { "name": "painter", "costume": "box", "x": -100, "y": 0 },
    { "name": "probe", "costume": "box", "x": 0, "y": 0, "layer": 1 }
  ],
  "steps": [
    { "op": "set_pen_color", "sprite": "painter", "color": "#ff0000" },
    { "op": "set_pen_size", "sprite": "painter", "size": 4 },
    { "op": "pen_down", "sprite": "painter" },
    { "op": "move_to", "sprite": "painter", "x": 100, "y": 0 },
    { "op": "touching_color", "sprite": "probe", "color": "#ff0000" },
    { "op": "flush" },
    { "op": "touching_color", "sprite": "probe", "color": "#ff0000" },
    { "op": "clear" },
    { "op": "flush" },
    { "op": "touching_color", "sprite": "probe", "color": "#ff0000" }
  ]
}"##;

fn runner() -> ScriptRunner {
    ScriptRunner::from_reader(SCRIPT.as_bytes(), ".").unwrap()
}

#[test]
fn replay_reports_probes_in_order() {
    let report = runner().run(StrategyChoice::Both).unwrap();
    let steps: Vec<usize> = report.probes.iter().map(|p| p.step).collect();
    assert_eq!(steps, [4, 6, 9]);

    let answers: Vec<(bool, bool)> = report
        .probes
        .iter()
        .map(|p| {
            (
                p.cpu.map(|h| h.touching).unwrap_or_default(),
                p.gpu.map(|h| h.touching).unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(answers, [(false, false), (true, true), (false, false)]);
    assert_eq!(report.pen.flushes, 2);
    assert_eq!(report.pen.clears, 1);
}

#[test]
fn single_strategy_leaves_the_other_empty() {
    let report = runner().run(StrategyChoice::Cpu).unwrap();
    assert!(report.probes.iter().all(|p| p.cpu.is_some() && p.gpu.is_none()));

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["probes"][0].get("gpu").is_none());
}

#[test]
fn unknown_names_are_validation_errors() {
    let mut script = runner().script().clone();
    script.steps.push(Step::Flush);
    script.steps.push(Step::PenUp {
        sprite: "nobody".to_string(),
    });
    let err = ScriptRunner::new(script, ".")
        .run(StrategyChoice::Cpu)
        .unwrap_err();
    assert!(err.to_string().contains("unknown sprite 'nobody'"));

    let mut script = runner().script().clone();
    script.sprites[0].costume = "missing".to_string();
    assert!(ScriptRunner::new(script, ".").run(StrategyChoice::Cpu).is_err());
}

#[test]
fn unknown_ops_fail_to_parse() {
    let err = ScriptRunner::from_reader(r#"{ "steps": [ { "op": "teleport" } ] }"#.as_bytes(), ".")
        .unwrap_err();
    assert!(matches!(err, PenError::Serde(_)));
}

#[test]
fn stamps_land_on_the_pen_layer() {
    let json = r##"{
      "costumes": { "box": { "kind": "solid", "width": 6, "height": 6, "color": "#0000ff" } },
      "sprites": [
        { "name": "stamper", "costume": "box", "x": 50, "y": 50 },
        { "name": "probe", "costume": "box", "x": 50, "y": 50 }
      ],
      "steps": [
        { "op": "stamp", "sprite": "stamper" },
        { "op": "move_to", "sprite": "stamper", "x": -150, "y": -100 },
        { "op": "flush" },
        { "op": "touching_color", "sprite": "probe", "color": "#0000ff" }
      ]
    }"##;
    let report = ScriptRunner::from_reader(json.as_bytes(), ".")
        .unwrap()
        .run(StrategyChoice::Both)
        .unwrap();
    let probe = &report.probes[0];
    assert_eq!(probe.cpu.map(|h| h.touching), Some(true));
    assert_eq!(probe.gpu.map(|h| h.touching), Some(true));
    assert_eq!(report.pen.stamps_drawn, 1);
}
