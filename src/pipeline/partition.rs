use std::collections::HashMap;

use itertools::Itertools;

use crate::host::SceneNode;

/// A root mesh node followed by its mesh descendants in depth-first order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    members: Vec<String>,
}

impl Group {
    pub fn root(&self) -> &str {
        &self.members[0]
    }

    pub fn children(&self) -> &[String] {
        &self.members[1..]
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|member| member == name)
    }
}

/// Splits the mesh nodes into one group per root mesh.
///
/// Traversal follows parent links through nodes of every kind, but only
/// meshes become members. A mesh whose ancestors are all non-mesh nodes
/// starts its own group.
pub fn partition(nodes: &[SceneNode]) -> Vec<Group> {
    let by_name: HashMap<&str, &SceneNode> =
        nodes.iter().map(|node| (node.name.as_str(), node)).collect();
    let children = nodes
        .iter()
        .filter_map(|node| node.parent.as_deref().map(|parent| (parent, node)))
        .into_group_map();

    nodes
        .iter()
        .filter(|node| node.kind.is_mesh())
        .filter(|node| !has_mesh_ancestor(node, &by_name))
        .map(|root| {
            let mut members = vec![root.name.clone()];
            collect_mesh_descendants(&root.name, &children, &mut members);

            log::info!(
                "Group '{}': 1 parent + {} children",
                root.name,
                members.len() - 1
            );

            Group { members }
        })
        .collect()
}

/// Maps every grouped node name to the root of its group.
pub fn group_roots(groups: &[Group]) -> HashMap<&str, &str> {
    groups
        .iter()
        .flat_map(|group| {
            group
                .members()
                .iter()
                .map(move |member| (member.as_str(), group.root()))
        })
        .collect()
}

fn has_mesh_ancestor(node: &SceneNode, by_name: &HashMap<&str, &SceneNode>) -> bool {
    // Bounded walk; the host promises an acyclic graph but a bad name table
    // should not hang the export.
    std::iter::successors(Some(node), |current| {
        current
            .parent
            .as_deref()
            .and_then(|parent| by_name.get(parent).copied())
    })
    .skip(1)
    .take(by_name.len())
    .any(|ancestor| ancestor.kind.is_mesh())
}

fn collect_mesh_descendants(
    name: &str,
    children: &HashMap<&str, Vec<&SceneNode>>,
    members: &mut Vec<String>,
) {
    let Some(direct) = children.get(name) else {
        return;
    };

    for child in direct {
        if child.kind.is_mesh() {
            members.push(child.name.clone());
        }
        collect_mesh_descendants(&child.name, children, members);
    }
}
