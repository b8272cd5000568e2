use super::locate::floor_char_boundary;
use crate::config::{FillOptions, Layout};
use crate::lexer::Span;
use crate::parser::{CompositeLiteral, Element, ValueExpr};
use serde::{Deserialize, Serialize};

/// A text replacement for one literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Byte range being replaced
    pub span: Span,
    /// New text for the range
    pub replacement: String,
}

impl Patch {
    /// Applies the patch to the source it was computed against
    pub fn apply(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() + self.replacement.len());
        out.push_str(&source[..self.span.start]);
        out.push_str(&self.replacement);
        out.push_str(&source[self.span.end..]);
        out
    }

    /// Applies non-overlapping patches, back to front so earlier spans stay valid
    pub fn apply_all(source: &str, patches: &[Patch]) -> String {
        let mut ordered: Vec<&Patch> = patches.iter().collect();
        ordered.sort_by(|a, b| b.span.start.cmp(&a.span.start));
        ordered
            .into_iter()
            .fold(source.to_string(), |text, patch| patch.apply(&text))
    }
}

/// Renders a literal back into Go syntax
///
/// `base_indent` is the indentation of the line the literal starts on;
/// multiline elements are indented one unit deeper. A literal carrying
/// comments is always multiline so line comments never swallow code.
pub fn render(literal: &CompositeLiteral, options: &FillOptions, base_indent: &str) -> String {
    let mut out = String::new();
    if let Some(ty) = &literal.type_text {
        out.push_str(ty);
    }
    out.push('{');

    let multiline =
        literal.has_comments() || (options.layout == Layout::Multiline && !is_flat(literal));
    if multiline {
        let inner = format!("{}{}", base_indent, options.indent);
        out.push('\n');
        render_lines(&mut out, literal, options, &inner);
        for comment in &literal.dangling {
            out.push_str(&inner);
            out.push_str(comment);
            out.push('\n');
        }
        out.push_str(base_indent);
    } else {
        for (i, element) in literal.elements.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if let Some(key) = &element.key {
                out.push_str(key.text());
                out.push_str(": ");
            }
            render_value(&mut out, &element.value, options, base_indent);
        }
    }

    out.push('}');
    out
}

/// Empty literals and plain value lists stay on one line
fn is_flat(literal: &CompositeLiteral) -> bool {
    literal.elements.iter().all(|e| {
        e.key.is_none() && !matches!(e.value, ValueExpr::Composite(_) | ValueExpr::AddressOf(_))
    })
}

/// Writes one element per line, gofmt style
///
/// Runs of single-line elements form sections; a multiline value or an
/// element with comments above it starts a new one. Values within a section
/// line up after the longest key, and trailing comments of consecutive lines
/// line up after the longest line.
fn render_lines(
    out: &mut String,
    literal: &CompositeLiteral,
    options: &FillOptions,
    indent: &str,
) {
    let values: Vec<String> = literal
        .elements
        .iter()
        .map(|element| {
            let mut value = String::new();
            render_value(&mut value, &element.value, options, indent);
            value
        })
        .collect();

    let mut start = 0;
    while start < values.len() {
        let mut end = start + 1;
        if !values[start].contains('\n') {
            while end < values.len()
                && !values[end].contains('\n')
                && literal.elements[end].comments.leading.is_empty()
            {
                end += 1;
            }
        }

        let section = &literal.elements[start..end];
        let key_width = section
            .iter()
            .filter_map(|e| e.key.as_ref())
            .map(|key| width(key.text()))
            .max()
            .unwrap_or(0);
        let lines: Vec<String> = section
            .iter()
            .zip(&values[start..end])
            .map(|(element, value)| element_line(element, value, key_width))
            .collect();

        let mut i = 0;
        while i < section.len() {
            // Consecutive lines with trailing comments share a comment column
            let mut run_end = i + 1;
            if !section[i].comments.trailing.is_empty() {
                while run_end < section.len() && !section[run_end].comments.trailing.is_empty() {
                    run_end += 1;
                }
            }
            let column = lines[i..run_end]
                .iter()
                .map(|line| last_line_width(line))
                .max()
                .unwrap_or(0);

            for (element, line) in section[i..run_end].iter().zip(&lines[i..run_end]) {
                for comment in &element.comments.leading {
                    out.push_str(indent);
                    out.push_str(comment);
                    out.push('\n');
                }
                out.push_str(indent);
                out.push_str(line);
                if !element.comments.trailing.is_empty() {
                    pad(out, column - last_line_width(line) + 1);
                    out.push_str(&element.comments.trailing.join(" "));
                }
                out.push('\n');
            }
            i = run_end;
        }
        start = end;
    }
}

/// `Key:` padded to the section's key column, the value, and the comma
fn element_line(element: &Element, value: &str, key_width: usize) -> String {
    let mut line = String::new();
    if let Some(key) = &element.key {
        line.push_str(key.text());
        line.push(':');
        pad(&mut line, key_width - width(key.text()) + 1);
    }
    line.push_str(value);
    line.push(',');
    line
}

fn render_value(out: &mut String, value: &ValueExpr, options: &FillOptions, indent: &str) {
    match value {
        ValueExpr::Opaque(text) | ValueExpr::Spread(text) => out.push_str(text),
        ValueExpr::Nil => out.push_str("nil"),
        ValueExpr::Composite(literal) => out.push_str(&render(literal, options, indent)),
        ValueExpr::AddressOf(literal) => {
            out.push('&');
            out.push_str(&render(literal, options, indent));
        }
    }
}

fn pad(out: &mut String, spaces: usize) {
    out.extend(std::iter::repeat(' ').take(spaces));
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn last_line_width(text: &str) -> usize {
    text.rsplit('\n').next().map_or(0, width)
}

/// Leading whitespace of the line containing `offset`
pub fn line_indent(source: &str, offset: usize) -> &str {
    let offset = floor_char_boundary(source, offset);
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let rest = &source[line_start..];
    let width = rest
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(rest.len());
    &rest[..width]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn sample() -> CompositeLiteral {
        CompositeLiteral::synthesized(
            "A",
            vec![
                Element::field("X", ValueExpr::opaque("1")),
                Element::field(
                    "B",
                    ValueExpr::Composite(CompositeLiteral::synthesized(
                        "B",
                        vec![Element::field("Y", ValueExpr::opaque("0"))],
                    )),
                ),
                Element::field("Next", ValueExpr::Nil),
                Element::field(
                    "Tags",
                    ValueExpr::Composite(CompositeLiteral::synthesized("[]string", vec![])),
                ),
            ],
        )
    }

    #[test]
    fn test_render_inline() {
        let options = FillOptions {
            layout: Layout::Inline,
            ..FillOptions::default()
        };
        assert_eq!(
            render(&sample(), &options, ""),
            "A{X: 1, B: B{Y: 0}, Next: nil, Tags: []string{}}"
        );
    }

    #[test]
    fn test_render_multiline() {
        let rendered = render(&sample(), &FillOptions::default(), "\t");
        assert_eq!(
            rendered,
            "A{\n\t\tX: 1,\n\t\tB: B{\n\t\t\tY: 0,\n\t\t},\n\t\tNext: nil,\n\t\tTags: []string{},\n\t}"
        );
    }

    #[test]
    fn test_multiline_aligns_keys_per_section() {
        let lit = CompositeLiteral::synthesized(
            "User",
            vec![
                Element::field("Name", ValueExpr::opaque("\"\"")),
                Element::field("Age", ValueExpr::opaque("0")),
                Element::field(
                    "Home",
                    ValueExpr::AddressOf(Box::new(CompositeLiteral::synthesized(
                        "Address",
                        vec![
                            Element::field("City", ValueExpr::opaque("\"\"")),
                            Element::field("ZipCode", ValueExpr::opaque("0")),
                        ],
                    ))),
                ),
                Element::field("Nickname", ValueExpr::opaque("\"\"")),
                Element::field("ID", ValueExpr::opaque("0")),
            ],
        );
        assert_eq!(
            render(&lit, &FillOptions::default(), ""),
            indoc! {r#"
                User{
                	Name: "",
                	Age:  0,
                	Home: &Address{
                		City:    "",
                		ZipCode: 0,
                	},
                	Nickname: "",
                	ID:       0,
                }"#}
        );
    }

    #[test]
    fn test_comments_rendered_around_elements() {
        let mut age = Element::field("Age", ValueExpr::opaque("30"));
        age.comments.trailing.push("// years".into());
        let mut name = Element::field("Name", ValueExpr::opaque("\"ann\""));
        name.comments.trailing.push("/* given */".into());
        let mut address = Element::field("Address", ValueExpr::opaque("\"\""));
        address.comments.leading.push("// where".into());
        let lit = CompositeLiteral {
            dangling: vec!["// end".into()],
            ..CompositeLiteral::synthesized("User", vec![name, age, address])
        };

        let inline = FillOptions {
            layout: Layout::Inline,
            ..FillOptions::default()
        };
        assert_eq!(
            render(&lit, &inline, ""),
            indoc! {r#"
                User{
                	Name: "ann", /* given */
                	Age:  30,    // years
                	// where
                	Address: "",
                	// end
                }"#}
        );
    }

    #[test]
    fn test_flat_sequences_stay_inline() {
        let lit = CompositeLiteral::synthesized(
            "[2]int",
            vec![
                Element::positional(ValueExpr::opaque("0")),
                Element::positional(ValueExpr::opaque("0")),
            ],
        );
        assert_eq!(render(&lit, &FillOptions::default(), ""), "[2]int{0, 0}");
    }

    #[test]
    fn test_line_indent_and_patch() {
        let source = indoc! {"
            func main() {
            \tu := User{Age: 1}
            }
        "};
        let start = source.find("User").unwrap();
        assert_eq!(line_indent(source, start), "\t");

        let end = source.find('}').unwrap() + 1;
        let patch = Patch {
            span: Span::new(start, end),
            replacement: "User{Name: \"\", Age: 1}".to_string(),
        };
        assert_eq!(
            patch.apply(source),
            "func main() {\n\tu := User{Name: \"\", Age: 1}\n}\n"
        );
    }

    #[test]
    fn test_apply_all_back_to_front() {
        let source = "a := T{}; b := T{}";
        let first = source.find("T{}").unwrap();
        let second = source.rfind("T{}").unwrap();
        let patches = vec![
            Patch {
                span: Span::new(first, first + 3),
                replacement: "T{A: 0}".into(),
            },
            Patch {
                span: Span::new(second, second + 3),
                replacement: "T{A: 0, B: 0}".into(),
            },
        ];
        assert_eq!(
            Patch::apply_all(source, &patches),
            "a := T{A: 0}; b := T{A: 0, B: 0}"
        );
    }
}
