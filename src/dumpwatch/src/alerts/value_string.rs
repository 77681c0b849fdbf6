//! Recovering labels from an alert's free-text value string.
//!
//! Pure functions only: text in, label sets out.

use regex::Regex;
use std::sync::LazyLock;

use super::labels::LabelSet;

static LABEL_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"labels=\{([^}]+)\}").expect("label block pattern is valid"));

fn parse_block(block: &str) -> LabelSet {
    let mut labels = LabelSet::default();
    for pair in block.split(", ") {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = Some(value.trim().to_string());
        match key.trim() {
            "cluster_type" => labels.cluster_type = value,
            "cluster" => labels.cluster = value,
            "container_name" => labels.container_name = value,
            "namespace" => labels.namespace = value,
            "task_pod_id" => labels.task_pod_id = value,
            "pod" if labels.task_pod_id.is_none() => labels.task_pod_id = value,
            "dump_kind" => labels.dump_kind = value,
            "container_ip" => labels.network_address = value,
            "exported_instance" if labels.network_address.is_none() => {
                labels.network_address = value
            }
            _ => {}
        }
    }
    labels
}

/// Every `labels={...}` block in the text, in order of appearance.
pub fn extract_label_blocks(text: &str) -> Vec<LabelSet> {
    LABEL_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|block| parse_block(block.as_str()))
        .collect()
}

/// The first `labels={...}` block only.
pub fn extract_first(text: &str) -> Option<LabelSet> {
    LABEL_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|block| parse_block(block.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_METRICS: &str = "[ var='A' labels={cluster=prod-eks, cluster_type=eks, \
        container_name=api, namespace=shop, pod=api-7d9f} value=0.97 ], \
        [ var='A' labels={cluster=prod-eks, cluster_type=eks, container_name=api, \
        namespace=shop, pod=api-5c4b} value=0.95 ]";

    #[test]
    fn test_single_block() {
        let labels = extract_first("[ var='B' labels={cluster=c1, task_pod_id=t-1, cluster_type=ecs, container_ip=10.0.0.4} value=1 ]").unwrap();
        assert_eq!(labels.cluster.as_deref(), Some("c1"));
        assert_eq!(labels.task_pod_id.as_deref(), Some("t-1"));
        assert_eq!(labels.cluster_type.as_deref(), Some("ecs"));
        assert_eq!(labels.network_address.as_deref(), Some("10.0.0.4"));
        assert_eq!(labels.namespace, None);
        assert_eq!(labels.dump_kind, None);
    }

    #[test]
    fn test_dump_kind_is_read_from_block() {
        let labels =
            extract_first("labels={cluster=c1, cluster_type=eks, pod=api-1, dump_kind=heap}").unwrap();
        assert_eq!(labels.dump_kind.as_deref(), Some("heap"));
    }

    #[test]
    fn test_repeated_blocks() {
        let blocks = extract_label_blocks(TWO_METRICS);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].task_pod_id.as_deref(), Some("api-7d9f"));
        assert_eq!(blocks[1].task_pod_id.as_deref(), Some("api-5c4b"));
        assert_eq!(extract_first(TWO_METRICS).unwrap(), blocks[0]);
    }

    #[test]
    fn test_aliases_do_not_override_primary_keys() {
        let labels = extract_first(
            "labels={task_pod_id=primary, pod=alias, container_ip=1.1.1.1, exported_instance=2.2.2.2}",
        )
        .unwrap();
        assert_eq!(labels.task_pod_id.as_deref(), Some("primary"));
        assert_eq!(labels.network_address.as_deref(), Some("1.1.1.1"));

        let labels = extract_first("labels={pod=alias, exported_instance=2.2.2.2:8081}").unwrap();
        assert_eq!(labels.task_pod_id.as_deref(), Some("alias"));
        assert_eq!(labels.network_address.as_deref(), Some("2.2.2.2:8081"));
    }

    #[test]
    fn test_malformed_text_yields_subset() {
        assert!(extract_label_blocks("no labels here").is_empty());
        assert!(extract_first("labels={}").is_none());

        let labels = extract_first("labels={cluster=c1, garbage, =x, pod}").unwrap();
        assert_eq!(labels.cluster.as_deref(), Some("c1"));
        assert_eq!(labels.task_pod_id, None);
    }
}
