use serde_json::Value;

const INDENT: &str = "  ";

/// Renders nested profile data as an indented, line-per-item text block.
pub struct PromptFormatter;

impl PromptFormatter {
    pub fn render(value: &Value) -> String {
        Self::render_at(value, 0)
    }

    /// Renders `value` with every line indented two spaces per `depth` level.
    ///
    /// Objects produce `key: value` lines in insertion order, arrays produce
    /// `Item n: value` lines. Scalars stay on the same line as their key;
    /// non-empty objects and arrays are rendered one level deeper on the
    /// lines that follow.
    pub fn render_at(value: &Value, depth: usize) -> String {
        let indent = INDENT.repeat(depth);

        match value {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| format!("{indent}{key}: {}", Self::render_entry(value, depth)))
                .collect::<Vec<_>>()
                .join("\n"),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    format!("{indent}Item {}: {}", idx + 1, Self::render_entry(item, depth))
                })
                .collect::<Vec<_>>()
                .join("\n"),
            scalar => format!("{indent}{}", Self::scalar_text(scalar)),
        }
    }

    fn render_entry(value: &Value, depth: usize) -> String {
        match value {
            Value::Object(_) | Value::Array(_) => {
                let nested = Self::render_at(value, depth + 1);
                if nested.is_empty() {
                    nested
                } else {
                    format!("\n{nested}")
                }
            }
            scalar => Self::scalar_text(scalar),
        }
    }

    fn scalar_text(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_renders_nothing() {
        assert_eq!(PromptFormatter::render(&json!({})), "");
    }

    #[test]
    fn flat_object_keeps_input_order() {
        assert_eq!(PromptFormatter::render(&json!({"a": 1, "b": 2})), "a: 1\nb: 2");
        assert_eq!(PromptFormatter::render(&json!({"b": 2, "a": 1})), "b: 2\na: 1");
    }

    #[test]
    fn nested_object_becomes_indented_block() {
        assert_eq!(
            PromptFormatter::render(&json!({"a": {"b": 1}})),
            "a: \n  b: 1"
        );
    }

    #[test]
    fn array_items_are_numbered_from_one() {
        assert_eq!(PromptFormatter::render(&json!([1, 2])), "Item 1: 1\nItem 2: 2");
    }

    #[test]
    fn array_of_objects_nests_under_items() {
        let value = json!({
            "meals": [
                {"name": "oats", "kcal": 350},
                {"name": "salad"}
            ]
        });
        assert_eq!(
            PromptFormatter::render(&value),
            "meals: \n  Item 1: \n    name: oats\n    kcal: 350\n  Item 2: \n    name: salad"
        );
    }

    #[test]
    fn scalars_use_plain_text() {
        let value = json!({
            "name": "Sam",
            "height_cm": 181.5,
            "vegetarian": true,
            "allergies": null
        });
        assert_eq!(
            PromptFormatter::render(&value),
            "name: Sam\nheight_cm: 181.5\nvegetarian: true\nallergies: null"
        );
    }

    #[test]
    fn empty_nested_collections_stay_on_key_line() {
        assert_eq!(
            PromptFormatter::render(&json!({"tags": [], "extra": {}})),
            "tags: \nextra: "
        );
    }

    #[test]
    fn starting_depth_indents_every_line() {
        assert_eq!(
            PromptFormatter::render_at(&json!({"a": {"b": 1}}), 1),
            "  a: \n    b: 1"
        );
        assert_eq!(PromptFormatter::render_at(&json!("x"), 2), "    x");
    }
}
