use dbscaffold_core::{Database, DotNetNaming, TypeResolver};

use crate::context::{ProjectLayout, ScaffoldContext};

/// Run `build` against a `Store` project over `database`.
pub(crate) fn with_context<R>(
    database: &Database,
    build: impl FnOnce(&ScaffoldContext<'_>) -> R,
) -> R {
    let types = TypeResolver::new(&database.type_mappings);
    let naming = DotNetNaming::new();
    let layout = ProjectLayout::new("Store", "Store");
    let ctx = ScaffoldContext::new(database, &types, &naming, &layout);
    build(&ctx)
}
