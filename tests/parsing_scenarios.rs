//! End-to-end parsing tests: template source in, records out.

use pretty_assertions::assert_eq;

use tabula::{parse, EngineError, Value};

const VLAN_TEMPLATE: &str = "\
Value Required VLAN_ID (\\d+)
Value VLAN_NAME (\\S+)

Start
  ^${VLAN_ID}\\s+${VLAN_NAME} [Record]
";

const INTERFACE_TEMPLATE: &str = "\
Value Filldown HOSTNAME (\\S+)
Value Required INTERFACE (\\S+)
Value List ADDRESS (\\d+\\.\\d+\\.\\d+\\.\\d+)

Start
  ^hostname ${HOSTNAME}
  ^interface ${INTERFACE} [Iface]

Iface
  ^\\s+ip address ${ADDRESS}
  ^! [Record, Start]
";

#[test]
fn test_vlan_table_one_record_per_row() {
    let records = parse(VLAN_TEMPLATE, "1 default\n10 finance\n").expect("Should parse");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("vlan_id"), Some(&Value::from("1")));
    assert_eq!(records[0].get("vlan_name"), Some(&Value::from("default")));
    assert_eq!(records[1].get("vlan_id"), Some(&Value::from("10")));
    assert_eq!(records[1].get("vlan_name"), Some(&Value::from("finance")));
}

#[test]
fn test_noise_lines_are_skipped_without_aborting() {
    let raw = "VLAN Name\n---- ----\n1 default\nbanner text\n10 finance\n";
    let records = parse(VLAN_TEMPLATE, raw).expect("Should parse");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("vlan_id"), Some(&Value::from("1")));
    assert_eq!(records[1].get("vlan_id"), Some(&Value::from("10")));
}

#[test]
fn test_interface_template_emits_one_record_per_block() {
    let raw = "\
hostname edge-01
interface Gi0/1
  ip address 10.0.0.1
  ip address 10.0.0.2
!
interface Gi0/2
  ip address 192.168.1.1
!
";

    let records = parse(INTERFACE_TEMPLATE, raw).expect("Should parse");
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].get("interface"), Some(&Value::from("Gi0/1")));
    assert_eq!(
        records[0].get("address"),
        Some(&Value::List(vec!["10.0.0.1".into(), "10.0.0.2".into()]))
    );
    assert_eq!(records[1].get("interface"), Some(&Value::from("Gi0/2")));
    assert_eq!(
        records[1].get("address"),
        Some(&Value::List(vec!["192.168.1.1".into()]))
    );
}

#[test]
fn test_filldown_value_carries_across_records() {
    let raw = "\
hostname edge-01
interface Gi0/1
  ip address 10.0.0.1
!
interface Gi0/2
  ip address 10.0.0.2
!
";

    let records = parse(INTERFACE_TEMPLATE, raw).expect("Should parse");
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.get("hostname"), Some(&Value::from("edge-01")));
    }
}

#[test]
fn test_trailing_block_recorded_at_end_of_input() {
    // No closing "!" after the block: the implicit end-of-input record
    // still captures it.
    let raw = "\
hostname edge-01
interface Gi0/1
  ip address 10.0.0.1
";

    let records = parse(INTERFACE_TEMPLATE, raw).expect("Should parse");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("interface"), Some(&Value::from("Gi0/1")));
}

#[test]
fn test_required_value_suppresses_trailing_partial() {
    // The Filldown hostname still holds a value after the last block's
    // Record, but INTERFACE (Required) does not, so nothing extra is
    // emitted at end of input.
    let raw = "\
hostname edge-01
interface Gi0/1
  ip address 10.0.0.1
!
";

    let records = parse(INTERFACE_TEMPLATE, raw).expect("Should parse");
    assert_eq!(records.len(), 1);
}

#[test]
fn test_field_order_follows_declaration_order() {
    let raw = "\
hostname edge-01
interface Gi0/1
  ip address 10.0.0.1
!
";

    let records = parse(INTERFACE_TEMPLATE, raw).expect("Should parse");
    let names: Vec<&str> = records[0].field_names().collect();
    assert_eq!(names, vec!["hostname", "interface", "address"]);
}

#[test]
fn test_error_action_aborts_with_message() {
    let template = "\
Value Required NAME (\\S+)

Start
  ^name ${NAME} [Record]
  ^garbage [Error(\"unparseable line\")]
";
    let raw = "name alpha\ngarbage\n";

    let err = parse(template, raw).expect_err("Should abort");
    match err {
        EngineError::Parse(e) => {
            assert!(e.to_string().contains("unparseable line"));
            assert_eq!(e.line, 2);
        }
        other => panic!("Expected parse error, got: {}", other),
    }
}

#[test]
fn test_no_matching_line_is_an_error() {
    let err = parse(VLAN_TEMPLATE, "nothing here\nmatches\n").expect_err("Should fail");
    assert!(matches!(err, EngineError::Parse(_)));
}

#[test]
fn test_empty_input_yields_no_records_and_no_error() {
    let records = parse(VLAN_TEMPLATE, "").expect("Should parse");
    assert!(records.is_empty());
}

#[test]
fn test_undeclared_placeholder_is_a_compile_error() {
    let template = "\
Value NAME (\\S+)

Start
  ^name ${NAME} port ${PORT} [Record]
";

    let err = parse(template, "name alpha\n").expect_err("Should fail");
    match err {
        EngineError::Template(e) => {
            assert!(e.to_string().contains("PORT"));
        }
        other => panic!("Expected template error, got: {}", other),
    }
}

#[test]
fn test_parsing_is_repeatable() {
    let raw = "\
hostname edge-01
interface Gi0/1
  ip address 10.0.0.1
!
";

    let first = parse(INTERFACE_TEMPLATE, raw).expect("Should parse");
    let second = parse(INTERFACE_TEMPLATE, raw).expect("Should parse");
    assert_eq!(first, second);
}
