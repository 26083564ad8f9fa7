use std::io::Write;

use crate::session::Session;
use crate::{Error, Result};

/// Prints the root, the `Objects` folder and two levels below it to `out`.
///
/// Stops at the first failure. Lines written up to that point stay written.
pub fn browse_nodes<S, W>(session: &S, out: &mut W) -> Result<()>
where
    S: Session + ?Sized,
    W: Write,
{
    let output_error = |e: std::io::Error| Error::Browse(format!("cannot write listing: {e}"));

    let root = session.root_node()?;
    writeln!(out, "Root Node: {root}").map_err(output_error)?;

    let objects = session.objects_node()?;
    writeln!(out, "Objects Node: {objects}").map_err(output_error)?;

    for node in session.children(&objects)? {
        writeln!(
            out,
            "Node: {node}, Browse Name: {}, Display Name: {}",
            node.browse_name, node.display_name
        )
        .map_err(output_error)?;

        for child in session.children(&node)? {
            writeln!(
                out,
                "   ↳ Child Node: {child}, Browse Name: {}, Display Name: {}",
                child.browse_name, child.display_name
            )
            .map_err(output_error)?;
        }
    }

    Ok(())
}
