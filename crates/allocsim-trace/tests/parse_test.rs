use std::io::Write;

use allocsim_trace::{load_jsonl, load_liveness_pair};

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_a_liveness_pair_trace_from_disk() {
    let size_list = write_temp("10 30000000\n11 25000000\n12 500\n");
    let liveness = write_temp("10 0 0 9 1\n11 3 0 9 1\n12 0 0 1 1\n");

    let size_list_content = std::fs::read_to_string(size_list.path()).unwrap();
    let liveness_content = std::fs::read_to_string(liveness.path()).unwrap();

    let events = load_liveness_pair(&size_list_content, &liveness_content).unwrap();
    // id 12 is below the large-block threshold and must be dropped.
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.id != 12));
}

#[test]
fn loads_a_jsonl_trace_from_disk() {
    let trace = write_temp(
        "{\"id\":1,\"size_bytes\":31457280,\"born\":0,\"die\":5}\n\
         {\"id\":2,\"size_bytes\":26214400,\"born\":1,\"die\":6}\n",
    );
    let content = std::fs::read_to_string(trace.path()).unwrap();
    let events = load_jsonl(&content).unwrap();
    assert_eq!(events.len(), 2);
}
