use serde_json::json;

use doc_convert_engine::protocol::{decode_command, ProtocolError, WorkerCommand, WorkerEvent};

#[test]
fn test_decode_convert() {
    let raw = json!({
        "cmd": "convert",
        "fileName": "report.docx",
        "from": "/tmp/input.docx",
        "to": "/tmp/output.pdf",
    });
    assert_eq!(
        decode_command(raw).unwrap(),
        WorkerCommand::Convert {
            file_name: "report.docx".to_owned(),
            from: "/tmp/input.docx".to_owned(),
            to: "/tmp/output.pdf".to_owned(),
        }
    );

    assert_eq!(
        decode_command(json!({ "cmd": "cleanup" })).unwrap(),
        WorkerCommand::Cleanup
    );
}

#[test]
fn test_wire_encoding_round_trips() {
    let command = WorkerCommand::Convert {
        file_name: "sheet.xlsx".to_owned(),
        from: "/tmp/input.xlsx".to_owned(),
        to: "/tmp/output.pdf".to_owned(),
    };
    assert_eq!(decode_command(command.to_wire()).unwrap(), command);
    assert_eq!(
        decode_command(WorkerCommand::Cleanup.to_wire()).unwrap(),
        WorkerCommand::Cleanup
    );
}

#[test]
fn test_unknown_command_named_in_error() {
    let err = decode_command(json!({ "cmd": "frobnicate" })).unwrap_err();
    assert_eq!(err, ProtocolError::UnknownCommand("frobnicate".to_owned()));
    assert_eq!(err.to_string(), "unknown message command: frobnicate");
}

#[test]
fn test_missing_and_malformed_commands() {
    assert_eq!(
        decode_command(json!({ "fileName": "x.odt" })).unwrap_err(),
        ProtocolError::MissingCommand
    );

    // A recognizable command with missing fields is malformed, not unknown.
    let err = decode_command(json!({ "cmd": "convert", "fileName": "x.odt" })).unwrap_err();
    match err {
        ProtocolError::Malformed { command, .. } => assert_eq!(command, "convert"),
        other => panic!("expected malformed error, got {:?}", other),
    }
}

#[test]
fn test_event_wire_shape() {
    let value = serde_json::to_value(WorkerEvent::Error {
        error: "boom".to_owned(),
        file_name: None,
        stack: None,
    })
    .unwrap();
    assert_eq!(value["cmd"], "error");
    assert_eq!(value["error"], "boom");
    // Absent optional fields stay off the wire.
    assert!(value.get("fileName").is_none());
    assert!(value.get("stack").is_none());

    let value = serde_json::to_value(WorkerEvent::Converted {
        file_name: "report.docx".to_owned(),
        from: "/tmp/input.docx".to_owned(),
        to: "/tmp/output.pdf".to_owned(),
    })
    .unwrap();
    assert_eq!(value["cmd"], "converted");
    assert_eq!(value["fileName"], "report.docx");
}
