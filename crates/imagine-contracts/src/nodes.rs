use indexmap::IndexMap;

use crate::request::{AspectRatio, ResponseFormat, DEFAULT_IMAGE_MODEL, MAX_BATCH_SIZE};

/// Widget kinds a host can render for one input parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Text {
        multiline: bool,
        default: &'static str,
    },
    Integer {
        default: i64,
        min: i64,
        max: i64,
    },
    Choice {
        options: &'static [&'static str],
        default: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

/// One registrable node: the unit the hosting environment exposes as a
/// graph node with the listed parameter widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: &'static str,
    pub display_name: String,
    pub category: &'static str,
    pub params: Vec<ParamSpec>,
}

pub fn generate_image_node() -> NodeSpec {
    NodeSpec {
        id: "Imagine_Image_Generate",
        display_name: display_name_for("Imagine_Image_Generate"),
        category: "image/generation",
        params: vec![
            ParamSpec {
                name: "api_key",
                kind: ParamKind::Text {
                    multiline: false,
                    default: "",
                },
                required: true,
            },
            ParamSpec {
                name: "prompt",
                kind: ParamKind::Text {
                    multiline: true,
                    default: "",
                },
                required: true,
            },
            ParamSpec {
                name: "model",
                kind: ParamKind::Choice {
                    options: &["grok-imagine-image", "grok-2-image"],
                    default: DEFAULT_IMAGE_MODEL,
                },
                required: true,
            },
            ParamSpec {
                name: "n",
                kind: ParamKind::Integer {
                    default: 1,
                    min: 1,
                    max: MAX_BATCH_SIZE as i64,
                },
                required: true,
            },
            ParamSpec {
                name: "aspect_ratio",
                kind: ParamKind::Choice {
                    options: AspectRatio::CHOICES,
                    default: "auto",
                },
                required: true,
            },
            ParamSpec {
                name: "response_format",
                kind: ParamKind::Choice {
                    options: ResponseFormat::CHOICES,
                    default: "url",
                },
                required: true,
            },
        ],
    }
}

#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: IndexMap<&'static str, NodeSpec>,
}

impl NodeRegistry {
    pub fn get(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.values()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        let mut nodes = IndexMap::new();
        let generate = generate_image_node();
        nodes.insert(generate.id, generate);
        Self { nodes }
    }
}

fn display_name_for(id: &str) -> String {
    id.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::{generate_image_node, NodeRegistry, ParamKind};

    #[test]
    fn registry_exposes_the_generation_node() {
        let registry = NodeRegistry::default();
        let node = registry.get("Imagine_Image_Generate").expect("node exists");
        assert_eq!(node.display_name, "Imagine Image Generate");
        assert_eq!(registry.list().count(), 1);
    }

    #[test]
    fn count_widget_is_bounded_one_to_ten() {
        let node = generate_image_node();
        let count = node
            .params
            .iter()
            .find(|param| param.name == "n")
            .expect("n param");
        assert_eq!(
            count.kind,
            ParamKind::Integer {
                default: 1,
                min: 1,
                max: 10
            }
        );
    }
}
