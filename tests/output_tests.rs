use allocscope::commands::{execute_flame, execute_stats, validate_snapshot_file, FlameArgs, InputArgs, StatsArgs};
use allocscope::flamegraph::FlamegraphConfig;
use allocscope::output::read_snapshot;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const STACKS: &str = "\
hash:1
0x10 (game) [main.cpp:3] main
0x20 (game) World::update
0x30 (game) Pool::grow
hash:2
0x10 (game) [main.cpp:3] main
0x40 (game) Renderer::draw
";

const ALLOCS: &str = "\
size: 300000
hash: 1
frame: 0

size: 100000
hash: 2
frame: 1
";

fn input(dir: &TempDir) -> InputArgs {
    let stacks = dir.path().join("stacks.txt");
    let allocations = dir.path().join("allocs.txt");
    fs::write(&stacks, STACKS).unwrap();
    fs::write(&allocations, ALLOCS).unwrap();
    InputArgs { stacks, allocations }
}

#[test]
fn test_flame_writes_svg_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let svg_path = dir.path().join("out/flame.svg");
    let json_path = dir.path().join("out/flame.json");

    execute_flame(FlameArgs {
        input: input(&dir),
        output_svg: Some(svg_path.clone()),
        output_json: Some(json_path.clone()),
        search: Some("pool".to_string()),
        select_first_match: true,
        flamegraph_config: FlamegraphConfig::new().with_title("Frame allocations"),
        ..Default::default()
    })
    .unwrap();

    let svg = fs::read_to_string(&svg_path).unwrap();
    assert!(svg.contains("Frame allocations"));
    assert!(svg.contains("Pool::grow"));

    let snapshot = read_snapshot(&json_path).unwrap();
    assert_eq!(snapshot.search_term.as_deref(), Some("pool"));
    assert_eq!(snapshot.rects.len(), 4);
    let matched: Vec<&str> = snapshot.rects.iter().filter(|r| r.matched).map(|r| r.name.as_str()).collect();
    assert_eq!(matched, vec!["Pool::grow"]);
    let selected: Vec<&str> = snapshot.rects.iter().filter(|r| r.selected).map(|r| r.name.as_str()).collect();
    assert_eq!(selected, vec!["Pool::grow"]);
    assert_eq!(snapshot.root_row_width(), snapshot.bounds.width);

    assert!(validate_snapshot_file(&json_path).is_ok());
}

#[test]
fn test_reverse_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("reverse.json");

    execute_flame(FlameArgs {
        input: input(&dir),
        output_svg: None,
        output_json: Some(json_path.clone()),
        reverse: true,
        ..Default::default()
    })
    .unwrap();

    let snapshot = read_snapshot(&json_path).unwrap();
    assert!(snapshot.reverse_stack);
    assert_eq!(snapshot.bounds.y, 0.0);
    assert!(snapshot.rects.iter().all(|r| r.y > 0.0));
}

#[test]
fn test_flame_fails_on_missing_dump() {
    let dir = tempfile::tempdir().unwrap();
    let result = execute_flame(FlameArgs {
        input: InputArgs {
            stacks: dir.path().join("missing.txt"),
            allocations: dir.path().join("missing-too.txt"),
        },
        output_svg: Some(dir.path().join("flame.svg")),
        ..Default::default()
    });

    assert!(result.is_err());
    assert!(!dir.path().join("flame.svg").exists());
}

#[test]
fn test_flame_svg_needs_data() {
    let dir = tempfile::tempdir().unwrap();
    let stacks = dir.path().join("stacks.txt");
    let allocations = dir.path().join("allocs.txt");
    fs::write(&stacks, STACKS).unwrap();
    fs::write(&allocations, "").unwrap();

    let result = execute_flame(FlameArgs {
        input: InputArgs { stacks, allocations },
        output_svg: Some(dir.path().join("flame.svg")),
        ..Default::default()
    });
    assert!(result.is_err());
}

#[test]
fn test_stats_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("stats.json");

    execute_stats(StatsArgs {
        input: input(&dir),
        top_stacks: 5,
        output_json: Some(json_path.clone()),
    })
    .unwrap();

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(report["stack_count"], 2);
    assert_eq!(report["sizes"]["total_size"], 400000);
    assert_eq!(report["hot_stacks"][0]["hash_id"], "1");
    assert_eq!(report["hot_stacks"][0]["call_path"], "main -> World::update -> Pool::grow");
    assert_eq!(report["frame_range"], serde_json::json!([0, 1]));
}
