//! Snapshot tests for Candid interface extraction
//!
//! These tests ensure the service descriptions extracted from checked programs stay consistent.
//! Run `cargo insta review` to update snapshots when output intentionally changes.

use motoko::api::Session;

/// Helper to check a single unit and extract its Candid interface
fn candid(source: &str) -> String {
    let mut session = Session::new();
    session.save_unit("main.mo", source);
    let result = session.extract_interface("main.mo").unwrap();
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    result.code.unwrap()
}

#[test]
fn test_single_update_method() {
    let candid = candid("actor { public func ping() : async () {} }");
    insta::assert_snapshot!(candid, @r"
    service : {
      ping: () -> ();
    }
    ");
}

#[test]
fn test_method_annotations_and_type_definitions() {
    let candid = candid(
        r#"actor {
  type Point = { x : Int; y : Int };
  public func move(p : Point) : async () {};
  public func log(t : Text) {};
  public query func size(xs : [Nat]) : async Nat { 0 };
}"#,
    );
    insta::assert_snapshot!(candid, @r"
    type Point = record { x : int; y : int };
    service : {
      move: (Point) -> ();
      log: (text) -> () oneway;
      size: (vec nat) -> (nat) query;
    }
    ");
}

#[test]
fn test_documented_actor() {
    let candid = candid(
        r#"/// Counter service
import Prim "mo:prim";
actor {
  /// Current value
  public query func get() : async Nat { 0 };
}"#,
    );
    insta::assert_snapshot!(candid, @r"
    /// Counter service
    service : {
      /// Current value
      get: () -> (nat) query;
    }
    ");
}

#[test]
fn test_programs_without_actor_describe_the_empty_service() {
    insta::assert_snapshot!(candid("module { public func f() {} }"), @"service : {}");
    insta::assert_snapshot!(candid("let x = 1; x"), @"service : {}");
}
