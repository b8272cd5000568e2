/// End-to-end fill scenarios
/// Demonstrates: Locate → Resolve → Normalize → Render on realistic Go files
use gofill::{
    Engine, Error, FillOptions, InMemorySources, Layout, ScopePath, TypeRegistry,
    UnknownTypePolicy,
};
use indoc::indoc;
use std::sync::Arc;

const MAIN_TYPES: &str = indoc! {r#"
    package main

    type User struct {
    	Name    string `json:"name,omitempty"`
    	Age     int    `json:"age,omitempty"`
    	Address string `json:"address,omitempty"`
    }

    type Account struct {
    	ID       string
    	Username string
    	Email    string
    	Active   bool
    }

    type ListNode struct {
    	Val  int       `json:"val,omitempty"`
    	Next *ListNode `json:"next,omitempty"`
    }

    type A struct {
    	X int
    	B B
    }

    type B struct {
    	Y int
    }

    type ddd1 struct {
    	ID   string `json:"id,omitempty"`
    	Age  int    `json:"age,omitempty"`
    	ddd2 *User  `json:"ddd2,omitempty"`
    }

    type Base struct {
    	ID int64
    }

    type Admin struct {
    	Base
    	Level int
    	Tags  []string
    	Meta  map[string]any
    	Score float64
    }

    type Loop struct {
    	Inner LoopInner
    }

    type LoopInner struct {
    	Back Loop
    }

    type Pair[K comparable, V any] struct {
    	Key K
    	Val V
    }
"#};

const USER_PACKAGE: &str = indoc! {r#"
    package user

    import (
    	protoimpl "google.golang.org/protobuf/runtime/protoimpl"
    )

    type Gender int32

    type User struct {
    	state         protoimpl.MessageState
    	sizeCache     protoimpl.SizeCache
    	unknownFields protoimpl.UnknownFields

    	Id       int64    `protobuf:"varint,1,opt,name=id,proto3" json:"id,omitempty"`
    	Name     string   `protobuf:"bytes,2,opt,name=name,proto3" json:"name,omitempty"`
    	IsVip    bool     `protobuf:"varint,3,opt,name=is_vip,json=isVip,proto3" json:"is_vip,omitempty"`
    	Gender   Gender   `protobuf:"varint,4,opt,name=gender,proto3,enum=user.Gender" json:"gender,omitempty"`
    	Roles    []string `protobuf:"bytes,5,rep,name=roles,proto3" json:"roles,omitempty"`
    	Profile  *Profile `protobuf:"bytes,6,opt,name=profile,proto3" json:"profile,omitempty"`
    }

    type Profile struct {
    	Bio string
    }
"#};

fn engine_with(layout: Layout) -> Engine {
    let sources = Arc::new(InMemorySources::new());
    sources.insert("main", "types.go", MAIN_TYPES);
    sources.insert("gotest/pb/user", "user.pb.go", USER_PACKAGE);
    let options = FillOptions {
        layout,
        ..FillOptions::default()
    };
    Engine::with_options(Arc::new(TypeRegistry::new(sources)), options)
}

/// Fills the literal around `needle` in `body`, wrapped into a main package file
fn fill_inline(body: &str, needle: &str) -> gofill::Result<String> {
    let source = format!(
        "package main\n\nimport \"gotest/pb/user\"\n\nfunc main() {{\n\t{}\n}}\n",
        body
    );
    let offset = source.find(needle).expect("needle in source");
    let patch = engine_with(Layout::Inline).fill_at(&source, offset, &ScopePath::new("main"))?;
    Ok(patch.replacement)
}

// =============================================================================
// BASIC SCENARIOS
// =============================================================================

#[test]
fn test_reorders_and_fills_missing_fields() {
    let out = fill_inline(r#"u := User{Address: "beijing", Name: "x"}"#, "Address").unwrap();
    assert_eq!(out, r#"User{Name: "x", Age: 0, Address: "beijing"}"#);
}

#[test]
fn test_fills_bool_and_string_zero_values() {
    let out = fill_inline(
        r#"a := Account{Email: "a@b.com", Username: "u"}"#,
        "Email",
    )
    .unwrap();
    assert_eq!(
        out,
        r#"Account{ID: "", Username: "u", Email: "a@b.com", Active: false}"#
    );
}

#[test]
fn test_self_referential_pointer_is_nil() {
    let out = fill_inline("n := ListNode{Val: 0}", "Val").unwrap();
    assert_eq!(out, "ListNode{Val: 0, Next: nil}");
}

#[test]
fn test_self_referential_pointer_literal_is_filled() {
    let out = fill_inline("n := ListNode{Next: &ListNode{Val: 5}}", "Next").unwrap();
    assert_eq!(out, "ListNode{Val: 0, Next: &ListNode{Val: 5, Next: nil}}");
}

#[test]
fn test_nested_value_struct_is_zero_filled() {
    let out = fill_inline("a := A{X: 1}", "X: 1").unwrap();
    assert_eq!(out, "A{X: 1, B: B{Y: 0}}");
}

#[test]
fn test_slice_elements_normalized_independently() {
    let out = fill_inline(
        r#"list := []User{{Address: "x"}, {Name: "y"}}"#,
        "Address",
    )
    .unwrap();
    assert_eq!(
        out,
        r#"[]User{{Name: "", Age: 0, Address: "x"}, {Name: "y", Age: 0, Address: ""}}"#
    );
}

#[test]
fn test_empty_literal_gets_every_field() {
    let out = fill_inline("a := Admin{}", "Admin{").unwrap();
    assert_eq!(
        out,
        "Admin{Base: Base{ID: 0}, Level: 0, Tags: []string{}, Meta: map[string]any{}, Score: 0.0}"
    );
}

// =============================================================================
// NESTING POSITIONS
// =============================================================================

#[test]
fn test_unexported_pointer_field_in_same_package() {
    let out = fill_inline(
        r#"d := ddd1{Age: 0, ID: "", ddd2: &User{Address: "", Name: ""}}"#,
        "Age: 0",
    )
    .unwrap();
    assert_eq!(
        out,
        r#"ddd1{ID: "", Age: 0, ddd2: &User{Name: "", Age: 0, Address: ""}}"#
    );
}

#[test]
fn test_map_values_are_filled_and_keys_kept() {
    let out = fill_inline(
        r#"m := map[string]User{"b": {Age: 2}, "a": User{Name: "n"}}"#,
        "\"b\"",
    )
    .unwrap();
    assert_eq!(
        out,
        r#"map[string]User{"b": {Name: "", Age: 2, Address: ""}, "a": User{Name: "n", Age: 0, Address: ""}}"#
    );
}

#[test]
fn test_call_argument_literal() {
    let out = fill_inline(
        r#"list = append(list, User{Name: "b"})"#,
        "Name: \"b\"",
    )
    .unwrap();
    assert_eq!(out, r#"User{Name: "b", Age: 0, Address: ""}"#);
}

#[test]
fn test_address_of_literal_argument() {
    let out = fill_inline("processStruct(&User{})", "User{}").unwrap();
    assert_eq!(out, r#"User{Name: "", Age: 0, Address: ""}"#);
}

#[test]
fn test_opaque_values_are_untouched() {
    let out = fill_inline(
        r#"u := User{Name: strings.ToUpper(name), Address: fmt.Sprintf("%d", n)}"#,
        "Name:",
    )
    .unwrap();
    assert_eq!(
        out,
        r#"User{Name: strings.ToUpper(name), Age: 0, Address: fmt.Sprintf("%d", n)}"#
    );
}

// =============================================================================
// CROSS-PACKAGE TYPES
// =============================================================================

#[test]
fn test_imported_type_skips_unexported_fields() {
    let out = fill_inline(r#"u := &user.User{Name: "n"}"#, "Name").unwrap();
    assert_eq!(
        out,
        r#"user.User{Id: 0, Name: "n", IsVip: false, Gender: 0, Roles: []string{}, Profile: nil}"#
    );
}

#[test]
fn test_imported_type_rejects_unknown_key() {
    let err = fill_inline(r#"u := user.User{Nmae: "x"}"#, "Nmae").unwrap_err();
    match err {
        Error::UnresolvableFieldName {
            type_name,
            field,
            declared,
        } => {
            assert_eq!(type_name, "user.User");
            assert_eq!(field, "Nmae");
            assert!(!declared.contains(&"state".to_string()));
            assert!(declared.contains(&"Profile".to_string()));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_unknown_imported_type() {
    let err = fill_inline("u := user.Missing{}", "Missing").unwrap_err();
    assert!(matches!(err, Error::TypeNotFound { ref name, .. } if name == "Missing"));
}

// =============================================================================
// GENERIC TYPES
// =============================================================================

#[test]
fn test_generic_instantiation_fills_with_type_arguments() {
    assert_eq!(
        fill_inline("p := Pair[int, string]{}", "Pair[").unwrap(),
        "Pair[int, string]{Key: 0, Val: \"\"}"
    );
}

#[test]
fn test_generic_authored_value_resolved_by_argument_type() {
    assert_eq!(
        fill_inline("p := Pair[string, User]{Val: User{Age: 1}}", "Pair[").unwrap(),
        "Pair[string, User]{Key: \"\", Val: User{Name: \"\", Age: 1, Address: \"\"}}"
    );
}

#[test]
fn test_generic_without_type_arguments_rejected() {
    let err = fill_inline("p := Pair{}", "Pair{").unwrap_err();
    assert!(matches!(err, Error::UnsupportedExpressionShape(_)));
}

// =============================================================================
// ERROR PATHS
// =============================================================================

#[test]
fn test_duplicate_key_rejected() {
    let err = fill_inline(r#"u := User{Name: "a", Name: "b"}"#, "Name").unwrap_err();
    assert_eq!(
        err,
        Error::DuplicateFieldKey {
            type_name: "User".into(),
            field: "Name".into()
        }
    );
}

#[test]
fn test_value_cycle_rejected() {
    let err = fill_inline("l := Loop{}", "Loop{").unwrap_err();
    match err {
        Error::CyclicNonPointerComposite { path } => {
            assert_eq!(path.first().map(String::as_str), Some("main.Loop"));
            assert_eq!(path.last().map(String::as_str), Some("main.Loop"));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_positional_struct_literal_rejected() {
    let err = fill_inline("b := B{1}", "B{1").unwrap_err();
    assert!(matches!(err, Error::UnsupportedExpressionShape(_)));
}

#[test]
fn test_cursor_outside_literal() {
    let err = fill_inline("x := 1", "x := 1").unwrap_err();
    assert!(matches!(err, Error::LiteralNotFound { line: 6, .. }));
}

#[test]
fn test_cursor_inside_multibyte_character() {
    let engine = engine_with(Layout::Inline);
    let scope = ScopePath::new("main");

    let source = "package main\n\n// naïve\nvar u = User{Name: \"José\"}\n";
    let in_comment = source.find('ï').unwrap() + 1;
    let err = engine.fill_at(source, in_comment, &scope).unwrap_err();
    assert_eq!(err, Error::LiteralNotFound { line: 3, col: 6 });

    let in_literal = source.find('é').unwrap() + 1;
    let patch = engine.fill_at(source, in_literal, &scope).unwrap();
    assert_eq!(patch.replacement, "User{Name: \"José\", Age: 0, Address: \"\"}");
}

// =============================================================================
// LAYOUT AND FILE-WIDE FILLS
// =============================================================================

#[test]
fn test_multiline_layout_follows_line_indent() {
    let source = indoc! {r#"
        package main

        func main() {
        	if ok {
        		a := A{X: 1}
        		_ = a
        	}
        }
    "#};
    let offset = source.find("X: 1").unwrap();
    let patch = engine_with(Layout::Multiline)
        .fill_at(source, offset, &ScopePath::new("main"))
        .unwrap();
    assert_eq!(
        patch.replacement,
        "A{\n\t\t\tX: 1,\n\t\t\tB: B{\n\t\t\t\tY: 0,\n\t\t\t},\n\t\t}"
    );
}

#[test]
fn test_fill_file_patches_and_reports() {
    let source = indoc! {r#"
        package main

        var a = A{X: 1}
        var b = B{Y: 2}
        var c = User{Name: "x", Name: "y"}
        var d = ListNode{Val: 3}
    "#};
    let report = engine_with(Layout::Inline)
        .fill_file(source, &ScopePath::new("main"))
        .unwrap();

    // `B{Y: 2}` is already complete
    assert_eq!(report.patches.len(), 2);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].line, 5);
    assert!(report.changed());
    assert_eq!(
        report.source,
        indoc! {r#"
            package main

            var a = A{X: 1, B: B{Y: 0}}
            var b = B{Y: 2}
            var c = User{Name: "x", Name: "y"}
            var d = ListNode{Val: 3, Next: nil}
        "#}
    );
}

#[test]
fn test_fill_is_idempotent() {
    let engine = engine_with(Layout::Multiline);
    let source = indoc! {r#"
        package main

        func main() {
        	n := ListNode{Next: &ListNode{Val: 5}}
        	list := []User{{Address: "x"}}
        	_, _ = n, list
        }
    "#};
    let first = engine.fill_file(source, &ScopePath::new("main")).unwrap();
    assert!(first.changed());
    let second = engine
        .fill_file(&first.source, &ScopePath::new("main"))
        .unwrap();
    assert!(!second.changed());
    assert_eq!(second.source, first.source);
}

// =============================================================================
// COMMENTS AND ALIGNMENT
// =============================================================================

#[test]
fn test_trailing_comment_survives_fill() {
    let engine = engine_with(Layout::Multiline);
    let source = indoc! {r#"
        package main

        func main() {
        	u := User{
        		Age: 3, // keep
        	}
        	_ = u
        }
    "#};
    let first = engine.fill_file(source, &ScopePath::new("main")).unwrap();
    assert_eq!(
        first.source,
        indoc! {r#"
            package main

            func main() {
            	u := User{
            		Name:    "",
            		Age:     3, // keep
            		Address: "",
            	}
            	_ = u
            }
        "#}
    );

    let second = engine
        .fill_file(&first.source, &ScopePath::new("main"))
        .unwrap();
    assert!(!second.changed());
}

#[test]
fn test_comments_force_multiline_in_inline_layout() {
    assert_eq!(
        fill_inline("u := User{Age: 3 /* years */, Name: \"x\"}", "User{").unwrap(),
        "User{\n\t\tName:    \"x\",\n\t\tAge:     3, /* years */\n\t\tAddress: \"\",\n\t}"
    );
}

#[test]
fn test_leading_and_closing_comments_kept_in_place() {
    let engine = engine_with(Layout::Multiline);
    let source = indoc! {r#"
        package main

        var a = Account{
        	// who
        	Username: "u",
        	Active: /* on */ true,
        	// more later
        }
    "#};
    let first = engine.fill_file(source, &ScopePath::new("main")).unwrap();
    assert_eq!(
        first.source,
        indoc! {r#"
            package main

            var a = Account{
            	ID: "",
            	// who
            	Username: "u",
            	Email:    "",
            	/* on */
            	Active: true,
            	// more later
            }
        "#}
    );

    let second = engine
        .fill_file(&first.source, &ScopePath::new("main"))
        .unwrap();
    assert_eq!(second.source, first.source);
}

#[test]
fn test_unknown_types_policy_empty_literal() {
    let sources = Arc::new(InMemorySources::new());
    sources.insert(
        "main",
        "types.go",
        "package main\n\nimport \"ext/lib\"\n\ntype W struct {\n\tOpt lib.Options\n\tN   int\n}\n",
    );
    let options = FillOptions {
        layout: Layout::Inline,
        unknown_types: UnknownTypePolicy::EmptyLiteral,
        ..FillOptions::default()
    };
    let engine = Engine::with_options(Arc::new(TypeRegistry::new(sources)), options);

    let source = "package main\n\nimport \"ext/lib\"\n\nvar w = W{N: 1}\n";
    let offset = source.find("N: 1").unwrap();
    let patch = engine
        .fill_at(source, offset, &ScopePath::new("main"))
        .unwrap();
    assert_eq!(patch.replacement, "W{Opt: lib.Options{}, N: 1}");
}
