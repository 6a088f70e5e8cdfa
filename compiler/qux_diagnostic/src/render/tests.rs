use super::*;
use crate::{BuildError, CompilerError, Location};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const SOURCE: &str = "fn main() {\n    print foo\n}\n";

fn loc(line: u32, col: u32, len: u32) -> Location {
    Location::new("a.Main", line, col, len).unwrap()
}

#[test]
fn test_plain_renders_verbatim() {
    let err = CompilerError::new("something broke");
    assert_eq!(render(&err, Some(&SourceLines::new(SOURCE))), "something broke");
}

#[test]
fn test_located_with_source() {
    let err = CompilerError::located("undeclared variable `foo`", loc(2, 10, 3));
    let text = render(&err, Some(&SourceLines::new(SOURCE)));
    assert_eq!(
        text,
        "a.Main@2:10-13: undeclared variable `foo`\n    print foo\n          ^^^"
    );
}

#[test]
fn test_caret_indent_keeps_tabs() {
    let source = SourceLines::new("fn main() {\n\t\tprint foo\n}\n");
    let err = CompilerError::located("undeclared variable `foo`", loc(2, 8, 3));
    assert_eq!(
        render(&err, Some(&source)),
        "a.Main@2:8-11: undeclared variable `foo`\n\t\tprint foo\n\t\t      ^^^"
    );
}

#[test]
fn test_located_without_source() {
    let err = CompilerError::located("undeclared variable `foo`", loc(2, 10, 3));
    assert_eq!(render(&err, None), "a.Main@2:10-13: undeclared variable `foo`");
}

#[test]
fn test_line_past_end_falls_back() {
    let err = CompilerError::located("late", loc(40, 0, 1));
    assert_eq!(render(&err, Some(&SourceLines::new(SOURCE))), "a.Main@40:0-1: late");
}

#[test]
fn test_span_crossing_line_end_falls_back() {
    let err = CompilerError::located("long", loc(1, 8, 10));
    assert_eq!(render(&err, Some(&SourceLines::new(SOURCE))), "a.Main@1:8-18: long");
}

#[test]
fn test_other_unit_falls_back() {
    let err = CompilerError::located("elsewhere", loc(2, 10, 3));
    let source = SourceLines::for_unit("a.Other", SOURCE);
    assert_eq!(render(&err, Some(&source)), "a.Main@2:10-13: elsewhere");
}

#[test]
fn test_list_in_order() {
    let err = BuildError::List(vec![
        BuildError::new("first"),
        BuildError::located("second", loc(2, 4, 5)),
        BuildError::new("third"),
    ]);
    let text = render(&err, Some(&SourceLines::new(SOURCE)));
    assert_eq!(
        text,
        "first\na.Main@2:4-9: second\n    print foo\n    ^^^^^\nthird"
    );
}

#[test]
fn test_empty_list_renders_nothing() {
    assert_eq!(render(&CompilerError::List(Vec::new()), None), "");
}

proptest! {
    #[test]
    fn in_bounds_location_renders_three_lines(
        line in proptest::collection::vec("[a-z ]{1,40}", 1..20),
        pick in any::<prop::sample::Index>(),
        col_seed in any::<u32>(),
        len_seed in any::<u32>(),
    ) {
        let text = line.join("\n");
        let idx = pick.index(line.len());
        let width = line[idx].chars().count() as u32;
        let col = col_seed % width;
        let len = 1 + len_seed % (width - col);
        let err = CompilerError::located("msg", loc(idx as u32 + 1, col, len));

        let rendered = render(&err, Some(&SourceLines::new(&text)));
        let lines: Vec<&str> = rendered.split('\n').collect();

        prop_assert_eq!(lines.len(), 3);
        prop_assert_eq!(lines[1], line[idx].as_str());
        let carets = lines[2].trim_start_matches(' ');
        prop_assert_eq!(lines[2].len() - carets.len(), col as usize);
        prop_assert_eq!(carets.len(), len as usize);
        prop_assert!(carets.chars().all(|c| c == '^'));
    }

    #[test]
    fn line_past_end_never_panics(extra in 1u32..1000) {
        let source = SourceLines::new(SOURCE);
        let line = source.len() as u32 + extra;
        let err = CompilerError::located("msg", loc(line, 0, 1));
        let rendered = render(&err, Some(&source));
        prop_assert_eq!(rendered.lines().count(), 1);
    }
}
