//! Interactive walking of a compiled tree.

use brush_bsp::{FaceAssignment, PlaneSet, Real, Tree};
use macroquad::prelude::*;
use nalgebra::Point3;

use crate::RenderVisitor;

/// Direction taken at each node in the navigation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Front,
    Back,
}

/// Walks a tree one node at a time, rendering only the current subtree.
#[derive(Debug, Default)]
pub struct TreeNavigator {
    path: Vec<Direction>,
}

impl TreeNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &[Direction] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Descends into the front child. Returns false at a leaf.
    pub fn go_front(&mut self, tree: &Tree) -> bool {
        self.descend(tree, Direction::Front)
    }

    /// Descends into the back child. Returns false at a leaf.
    pub fn go_back(&mut self, tree: &Tree) -> bool {
        self.descend(tree, Direction::Back)
    }

    fn descend(&mut self, tree: &Tree, direction: Direction) -> bool {
        match self.current(tree) {
            Some(Tree::Node(_)) => {
                self.path.push(direction);
                true
            }
            _ => false,
        }
    }

    pub fn go_parent(&mut self) -> bool {
        self.path.pop().is_some()
    }

    pub fn go_root(&mut self) {
        self.path.clear();
    }

    /// Handles keyboard input. Returns true if the position changed.
    pub fn update(&mut self, tree: &Tree) -> bool {
        let mut changed = false;

        if is_key_pressed(KeyCode::F) {
            changed = self.go_front(tree);
        }
        if is_key_pressed(KeyCode::B) {
            changed = self.go_back(tree);
        }
        if is_key_pressed(KeyCode::P) {
            changed = self.go_parent();
        }
        if is_key_pressed(KeyCode::R) && !self.path.is_empty() {
            self.go_root();
            changed = true;
        }

        changed
    }

    /// The subtree at the current path, or `None` if the path is stale.
    pub fn current<'a>(&self, tree: &'a Tree) -> Option<&'a Tree> {
        let mut current = tree;
        for dir in &self.path {
            let Tree::Node(node) = current else {
                return None;
            };
            current = match dir {
                Direction::Front => node.front(),
                Direction::Back => node.back(),
            };
        }
        Some(current)
    }

    /// Renders the current subtree back to front. Returns the number of faces drawn.
    pub fn render(
        &self,
        tree: &Tree,
        faces: &FaceAssignment,
        planes: &PlaneSet,
        eye: &Point3<Real>,
        outline: bool,
    ) -> usize {
        let Some(subtree) = self.current(tree) else {
            return 0;
        };
        let mut visitor = RenderVisitor::new(outline);
        subtree.traverse_back_to_front(faces, planes, eye, &mut visitor);
        visitor.drawn
    }

    /// Draws the navigation overlay.
    pub fn draw_ui(&self, tree: &Tree, faces: &FaceAssignment, planes: &PlaneSet, y_offset: f32) {
        let path_str = if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path
                .iter()
                .map(|d| match d {
                    Direction::Front => "F",
                    Direction::Back => "B",
                })
                .collect::<Vec<_>>()
                .join(" -> ")
        };
        draw_text(
            &format!("Path: {} (depth {})", path_str, self.path.len()),
            10.0,
            y_offset,
            18.0,
            YELLOW,
        );

        let (detail, color) = match self.current(tree) {
            Some(Tree::Node(node)) => {
                let plane = planes.get(node.plane_num);
                (
                    format!(
                        "Node plane {} ({:.2} {:.2} {:.2}) d={:.1}, {} faces | [F]ront [B]ack",
                        node.plane_num,
                        plane.normal.x,
                        plane.normal.y,
                        plane.normal.z,
                        plane.dist,
                        faces.faces_for(node.id).len(),
                    ),
                    GREEN,
                )
            }
            Some(Tree::Leaf(leaf)) => (
                format!(
                    "Leaf: {} | {} brushes",
                    if leaf.contents.is_empty() {
                        "empty".to_string()
                    } else {
                        format!("{:?}", leaf.contents)
                    },
                    leaf.brushes.len()
                ),
                ORANGE,
            ),
            None => ("(invalid path)".to_string(), RED),
        };
        draw_text(&detail, 10.0, y_offset + 20.0, 18.0, color);
        draw_text("[P]arent | [R]oot", 10.0, y_offset + 40.0, 16.0, DARKGRAY);
    }
}
