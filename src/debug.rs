use core::{
    fmt::{self, Write},
    ptr::NonNull,
};
use std::{collections::VecDeque, string::String};

use crate::{Augment, AvlTree, Links, TreeNode};

impl<T, A> AvlTree<T, A>
where
    T: TreeNode<Links<T, A>> + fmt::Display + ?Sized,
    A: Augment,
    A::Property: fmt::Debug,
{
    /// Writes a Graphviz rendering of the tree to `w`, one rank per tree level.
    ///
    /// Nodes are labelled `item:height:property`.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T: ?Sized> {
            Node { id: usize, ptr: NonNull<T> },
            Missing(usize),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node { id: 0, ptr: root });

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        // Keys may repeat, so nodes are identified by their breadth-first position.
        let mut next_id = 1;
        let mut links = String::new();

        while !queue.is_empty() {
            let remaining = queue.len();

            write!(w, "{{rank=same; ")?;

            for _ in 0..remaining {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let (id, node) = match item {
                    Item::Node { id, ptr } => (id, ptr),
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let (height, property) = unsafe {
                    let links = Self::links(node);
                    (links.height(), links.property())
                };
                let label = unsafe { node.as_ref() };
                write!(
                    w,
                    "\"graph{name}-{id}\" [label=\"{label}:{height}:{property:?}\"]; "
                )?;

                for child in unsafe { [Self::links(node).left(), Self::links(node).right()] } {
                    let child_id = next_id;
                    next_id += 1;

                    queue.push_back(match child {
                        Some(ptr) => Item::Node { id: child_id, ptr },
                        None => Item::Missing(child_id),
                    });

                    writeln!(links, "\"graph{name}-{id}\" -> \"graph{name}-{child_id}\";")?;
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
