//! Spec parsing tests through the public API: grammar coverage, the
//! parse/render round trip, and path resolution.

use fsbuild::spec::{resolve_path, DeviceKind, Entry, ParseError, ParseOptions};

// =============================================================================
// Grammar coverage
// =============================================================================

#[test]
fn decodes_every_entry_type() {
    let cases: &[(&str, fn(&Entry) -> bool)] = &[
        ("dir /bin 0755 0 0", |e| matches!(e, Entry::Dir { .. })),
        ("slink /sbin /bin 0 0", |e| {
            matches!(e, Entry::Symlink { .. })
        }),
        ("file /bin/init /host/init 0755 0 0", |e| {
            matches!(e, Entry::File { .. })
        }),
        ("nod /dev/console 0600 0 0 c 5 1", |e| {
            matches!(
                e,
                Entry::Node {
                    kind: DeviceKind::Char,
                    ..
                }
            )
        }),
        ("pipe /initctl 0600 0 0", |e| {
            matches!(
                e,
                Entry::Node {
                    kind: DeviceKind::Fifo,
                    ..
                }
            )
        }),
        ("sock /notify 0600 0 0", |e| {
            matches!(
                e,
                Entry::Node {
                    kind: DeviceKind::Socket,
                    ..
                }
            )
        }),
    ];

    for (line, matches_variant) in cases {
        let entry = Entry::parse(line).unwrap_or_else(|e| panic!("'{}' failed: {}", line, e));
        assert!(matches_variant(&entry), "'{}' decoded to {:?}", line, entry);
    }
}

#[test]
fn char_device_fields_land_where_expected() {
    match Entry::parse("nod /dev/null 0666 0 0 c 1 3").unwrap() {
        Entry::Node {
            name,
            mode,
            uid,
            gid,
            kind,
            major,
            minor,
        } => {
            assert_eq!(name, "/dev/null");
            assert_eq!(mode, 0o666);
            assert_eq!(uid, 0);
            assert_eq!(gid, 0);
            assert_eq!(kind, DeviceKind::Char);
            assert_eq!(major, 1);
            assert_eq!(minor, 3);
        }
        other => panic!("expected node, got {:?}", other),
    }
}

#[test]
fn block_device_uses_same_grammar() {
    match Entry::parse("nod /dev/sda 0660 0 6 b 8 0").unwrap() {
        Entry::Node {
            kind: DeviceKind::Block,
            major: 8,
            minor: 0,
            ..
        } => {}
        other => panic!("expected block node, got {:?}", other),
    }
}

// =============================================================================
// Parse/render round trip
// =============================================================================

#[test]
fn parse_then_render_reproduces_the_fields() {
    let lines = [
        "dir /usr/share 0755 0 0",
        "dir /tmp 1777 0 0",
        "slink /var/run /run 0 0",
        "file /etc/hostname /host/etc/hostname 0644 0 0",
        "nod /dev/console 0600 0 5 c 5 1",
        "nod /dev/loop0 0660 0 6 b 7 0",
        "pipe /run/initctl 0600 0 0",
        "sock /dev/log 0666 0 0",
    ];

    for line in lines {
        let entry = Entry::parse(line).unwrap();
        let rendered = entry.to_string();
        let reparsed = Entry::parse(&rendered)
            .unwrap_or_else(|e| panic!("render '{}' did not reparse: {}", rendered, e));
        assert_eq!(reparsed, entry, "round trip changed '{}'", line);
    }
}

#[test]
fn render_is_whitespace_normalized_only() {
    let entry = Entry::parse("file\t/a\t\t/b   0644  12 34").unwrap();
    assert_eq!(entry.to_string(), "file /a /b 0644 12 34");
}

// =============================================================================
// Rejection behavior
// =============================================================================

#[test]
fn unknown_type_is_its_own_error() {
    assert_eq!(
        Entry::parse("bogus x y z"),
        Err(ParseError::UnknownEntryType("bogus".to_string()))
    );
}

#[test]
fn separator_is_required() {
    assert_eq!(Entry::parse("dir"), Err(ParseError::MalformedLine));
    assert_eq!(Entry::parse("nod"), Err(ParseError::MalformedLine));
}

#[test]
fn field_errors_name_the_entry_kind() {
    match Entry::parse("dir /bin 0755 0") {
        Err(ParseError::MalformedArgs { kind: "dir", .. }) => {}
        other => panic!("expected dir MalformedArgs, got {:?}", other),
    }
    match Entry::parse("nod /x 0644 0 0 q 1 2") {
        Err(ParseError::MalformedArgs { kind: "nod", .. }) => {}
        other => panic!("expected nod MalformedArgs, got {:?}", other),
    }
}

#[test]
fn legacy_slink_is_opt_in_and_mode_is_dropped() {
    let legacy = "slink /sbin /bin 0777 0 0";
    assert!(Entry::parse(legacy).is_err());

    let opts = ParseOptions {
        legacy_slink_mode: true,
    };
    let entry = Entry::parse_with(legacy, opts).unwrap();
    assert_eq!(entry, Entry::parse("slink /sbin /bin 0 0").unwrap());
    // Rendering produces the canonical mode-less form.
    assert_eq!(entry.to_string(), "slink /sbin /bin 0 0");
}

// =============================================================================
// Path resolution
// =============================================================================

#[test]
fn leading_separator_is_stripped() {
    assert_eq!(resolve_path("/a/b").unwrap(), "a/b");
    assert_eq!(resolve_path("a/b").unwrap(), "a/b");
}

#[test]
fn resolution_is_idempotent() {
    for name in ["/a/b", "a/b", "//x", "/", "a//b"] {
        let once = resolve_path(name).unwrap();
        let twice = resolve_path(once).unwrap();
        assert_eq!(once, twice, "resolving '{}' twice diverged", name);
    }
}

#[test]
fn overlong_paths_are_rejected() {
    let long = format!("/{}", "x".repeat(fsbuild::spec::PATH_MAX + 1));
    assert!(matches!(
        resolve_path(&long),
        Err(ParseError::PathTooLong { .. })
    ));
}
