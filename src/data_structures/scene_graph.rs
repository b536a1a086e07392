//! Scene graph and hierarchical scene organization.
//!
//! Every node owns its children exclusively (`Box<dyn SceneNode>`), so the
//! graph is always a tree. A node either groups children ([`ContainerNode`])
//! or is a leaf drawable ([`MeshNode`]). World transforms are derived top-down
//! from the local transforms with [`SceneNode::update_world_transforms`].

use crate::data_structures::{
    instance::Instance,
    model::{Material, MeshData},
};

pub trait SceneNode {
    fn name(&self) -> &str;

    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn get_world_transform(&self) -> &Instance;

    /// Recompute this node's world transform under `parent` and recurse.
    fn update_world_transforms(&mut self, parent: &Instance);

    fn get_children(&self) -> &[Box<dyn SceneNode>];

    fn get_children_mut(&mut self) -> &mut [Box<dyn SceneNode>];

    /// Geometry and material if this node is drawable.
    fn drawable(&self) -> Option<(&MeshData, &Material)>;
}

/// Depth-first, parent before children.
pub fn walk<'a>(node: &'a dyn SceneNode, visit: &mut dyn FnMut(&'a dyn SceneNode)) {
    visit(node);
    for child in node.get_children() {
        walk(child.as_ref(), visit);
    }
}

/// Number of nodes in the subtree, `node` included, that satisfy `pred`.
pub fn count_nodes(node: &dyn SceneNode, pred: &dyn Fn(&dyn SceneNode) -> bool) -> usize {
    let mut count = 0;
    walk(node, &mut |n| {
        if pred(n) {
            count += 1;
        }
    });
    count
}

pub struct ContainerNode {
    name: String,
    local: Instance,
    world: Instance,
    children: Vec<Box<dyn SceneNode>>,
}

impl ContainerNode {
    pub fn new(name: &str, local: Instance) -> Self {
        Self {
            name: name.to_string(),
            world: local.clone(),
            local,
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    pub fn with_child(mut self, child: Box<dyn SceneNode>) -> Self {
        self.add_child(child);
        self
    }
}

impl SceneNode for ContainerNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_world_transform(&self) -> &Instance {
        &self.world
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn get_children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut [Box<dyn SceneNode>] {
        &mut self.children
    }

    fn drawable(&self) -> Option<(&MeshData, &Material)> {
        None
    }
}

pub struct MeshNode {
    name: String,
    local: Instance,
    world: Instance,
    mesh: MeshData,
    material: Material,
}

impl MeshNode {
    pub fn new(name: &str, mesh: MeshData, material: Material, local: Instance) -> Self {
        Self {
            name: name.to_string(),
            world: local.clone(),
            local,
            mesh,
            material,
        }
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn material(&self) -> &Material {
        &self.material
    }
}

impl SceneNode for MeshNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_world_transform(&self) -> &Instance {
        &self.world
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
    }

    fn get_children(&self) -> &[Box<dyn SceneNode>] {
        &[]
    }

    fn get_children_mut(&mut self) -> &mut [Box<dyn SceneNode>] {
        &mut []
    }

    fn drawable(&self) -> Option<(&MeshData, &Material)> {
        Some((&self.mesh, &self.material))
    }
}
