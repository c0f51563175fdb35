use std::path::PathBuf;

use altq::replay::{Script, run};
use altq_server::Settings;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

#[tokio::test]
async fn demo_script_replays() {
    let script = Script::load(&demo("replay.ron")).expect("demo script parses");
    let out = run(&script, &Settings::default(), None).await.expect("replay");
    let views: Vec<&str> = out.lines().filter(|l| l.starts_with("view ")).collect();
    assert_eq!(
        views,
        vec![
            "view window=1 ok=true tabs=3",
            "view window=1 ok=true tabs=2",
            "view window=2 ok=true tabs=0",
            "view window=none ok=false tabs=0",
        ]
    );
    assert!(out.contains("  *  12 Docs [snapshot]"), "{out}");
    assert!(out.contains("activate 13: ok=true"), "{out}");
}

#[test]
fn demo_settings_parse() {
    let text = std::fs::read_to_string(demo("settings.ron")).expect("read");
    assert_eq!(Settings::from_ron_str(&text).expect("parse"), Settings::default());
}
