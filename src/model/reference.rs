//! Referenced-by ancestry strategies.

use super::chunk::{Chunk, ChunkId};
use super::web::Web;

/// How much of a chunk's "referenced by" ancestry a weaver shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceStyle {
    /// Direct parents only.
    #[default]
    Simple,
    /// Each parent followed by that parent's own ancestry, in encounter
    /// order. The reference graph is acyclic by construction, so no
    /// cycle guard is needed here.
    Transitive,
}

impl ReferenceStyle {
    /// The chunks referencing `chunk`, per this strategy. Pure: reads
    /// only the `referenced_by` edges created by the closure pass.
    pub fn chunk_referenced_by(&self, web: &Web, chunk: &Chunk) -> Vec<ChunkId> {
        match self {
            ReferenceStyle::Simple => chunk.referenced_by.clone(),
            ReferenceStyle::Transitive => {
                let mut closure = Vec::new();
                walk(web, &chunk.referenced_by, &mut closure);
                closure
            }
        }
    }
}

fn walk(web: &Web, parents: &[ChunkId], out: &mut Vec<ChunkId>) {
    for &parent in parents {
        out.push(parent);
        walk(web, &web.chunk(parent).referenced_by, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Main -> Parent -> Sub: Parent references Sub, Main references Parent.
    fn chain() -> Web {
        let mut web = Web::new();
        let mut main = Chunk::output("main.code", None, None);
        main.append_text("@", 1);
        main.append(crate::model::Command::Reference {
            name: "Parent".to_string(),
            line: 1,
        });
        web.add(main).unwrap();

        let mut parent = Chunk::named("Parent");
        parent.append(crate::model::Command::Reference {
            name: "Sub".to_string(),
            line: 2,
        });
        web.add(parent).unwrap();

        let mut sub = Chunk::named("Sub");
        sub.append_text("leaf", 3);
        web.add(sub).unwrap();

        web.create_used_by().unwrap();
        web
    }

    #[test]
    fn test_simple_finds_direct_parent_only() {
        let web = chain();
        let sub = &web.chunks()[2];
        let refs = ReferenceStyle::Simple.chunk_referenced_by(&web, sub);
        assert_eq!(1, refs.len());
        assert_eq!(Some("Parent"), web.chunk(refs[0]).name.as_deref());
    }

    #[test]
    fn test_transitive_finds_full_ancestry_in_order() {
        let web = chain();
        let sub = &web.chunks()[2];
        let refs = ReferenceStyle::Transitive.chunk_referenced_by(&web, sub);
        assert_eq!(2, refs.len());
        assert_eq!(Some("Parent"), web.chunk(refs[0]).name.as_deref());
        assert_eq!(Some("main.code"), web.chunk(refs[1]).name.as_deref());
    }
}
