//! Include resolution against real template trees.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use templar::assembler::Assembler;
use templar::cache::TemplateCache;
use templar::{Templar, TemplarError};

use crate::common::{MarkingStyleShrinker, SquashShrinker, TemplateTree};

#[tokio::test]
async fn include_directive_is_replaced_by_child_content() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "{% include \"b.tpl\" %}tail")?;
    tree.write("b.tpl", "head")?;

    let templar = Templar::new(tree.options()).await?;
    let rendered = templar.render_file("a.tpl", &Value::Null).await?;

    assert_eq!(rendered, "headtail");
    Ok(())
}

#[tokio::test]
async fn nested_includes_flatten_recursively() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "[{% include 'b.tpl' %}]")?;
    tree.write("b.tpl", "({% include 'c.tpl' %})")?;
    tree.write("c.tpl", "core")?;

    let templar = Templar::new(tree.options()).await?;
    let rendered = templar.render_file("a.tpl", &Value::Null).await?;

    assert_eq!(rendered, "[(core)]");
    Ok(())
}

#[tokio::test]
async fn include_ids_resolve_against_the_root_not_the_includer() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("pages/home.tpl", "{% include \"partials/head.tpl\" %}body")?;
    tree.write("partials/head.tpl", "head|")?;

    let templar = Templar::new(tree.options()).await?;
    let rendered = templar.render_file("pages/home.tpl", &Value::Null).await?;

    assert_eq!(rendered, "head|body");
    Ok(())
}

#[tokio::test]
async fn included_stylesheets_are_shrunk_at_fetch_but_never_scanned() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "<style>{% include \"site.css\" %}</style>")?;
    tree.write("site.css", "body { color: red; }")?;

    let style = Arc::new(MarkingStyleShrinker::default());
    let templar = Templar::with_shrinkers(
        tree.options(),
        Arc::new(SquashShrinker::default()),
        Arc::clone(&style) as Arc<dyn templar::StyleShrinker>,
    )
    .await?;

    let rendered = templar.render_file("a.tpl", &Value::Null).await?;

    // Shrunk once on fetch; compression is off so no second pass.
    assert_eq!(rendered, "<style>body { color: red; }/*shrunk*/</style>");
    assert_eq!(style.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_include_target_fails_without_phantom_cache_entries() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "{% include \"missing.tpl\" %}")?;

    let templar = Templar::new(tree.options()).await?;

    let err = templar.compile_file("a.tpl").await.expect_err("must fail");
    match err {
        TemplarError::TemplateNotFound { id } => assert_eq!(id, "missing.tpl"),
        other => panic!("unexpected error: {other}"),
    }

    // No phantom entries: creating the file is enough for the next compile
    // to succeed, and the failed top-level template was not cached compiled.
    tree.write("missing.tpl", "found")?;
    let rendered = templar.render_file("a.tpl", &Value::Null).await?;
    assert_eq!(rendered, "found");
    Ok(())
}

#[tokio::test]
async fn missing_top_level_template_fails_with_not_found() -> Result<()> {
    let tree = TemplateTree::new()?;
    let templar = Templar::new(tree.options()).await?;

    let err = templar.compile_file("ghost.tpl").await.expect_err("must fail");
    assert!(matches!(err, TemplarError::TemplateNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn circular_includes_are_reported_not_recursed() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "a{% include \"b.tpl\" %}")?;
    tree.write("b.tpl", "b{% include \"a.tpl\" %}")?;

    let templar = Templar::new(tree.options()).await?;

    let err = templar.compile_file("a.tpl").await.expect_err("must fail");
    match err {
        TemplarError::CircularInclude { chain } => {
            assert_eq!(chain, "a.tpl -> b.tpl -> a.tpl");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn self_include_is_the_smallest_cycle() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "{% include \"a.tpl\" %}")?;

    let templar = Templar::new(tree.options()).await?;

    let err = templar.compile_file("a.tpl").await.expect_err("must fail");
    assert!(matches!(err, TemplarError::CircularInclude { .. }));
    Ok(())
}

#[tokio::test]
async fn opaque_included_content_is_never_directive_scanned() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "literal: {% include 'note.txt' %}")?;
    // The opaque file's text looks like a directive but must stay verbatim.
    tree.write("note.txt", "{% include 'b.tpl' %}")?;
    tree.write("b.tpl", "resolved")?;

    let cache = Mutex::new(TemplateCache::new());
    let style = MarkingStyleShrinker::default();
    let flattened = Assembler::new(tree.root(), &cache, &style).flatten("a.tpl").await?;

    assert_eq!(flattened, "literal: {% include 'b.tpl' %}");
    Ok(())
}

#[tokio::test]
async fn self_referencing_stylesheet_text_stays_literal_and_terminates() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "{% include \"x.css\" %}")?;
    tree.write("x.css", "{% include \"x.css\" %}")?;

    let cache = Mutex::new(TemplateCache::new());
    let style = MarkingStyleShrinker::default();
    let flatten = Assembler::new(tree.root(), &cache, &style).flatten("a.tpl");
    let flattened = tokio::time::timeout(Duration::from_secs(5), flatten).await??;

    // The stylesheet was shrunk once at fetch and embedded as plain text.
    assert_eq!(flattened, "{% include \"x.css\" %}/*shrunk*/");
    assert_eq!(style.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn repeated_inclusion_of_one_child_is_served_from_the_content_store() -> Result<()> {
    let tree = TemplateTree::new()?;
    tree.write("a.tpl", "{% include 'b.tpl' %}+{% include 'b.tpl' %}")?;
    tree.write("b.tpl", "x")?;

    let templar = Templar::new(tree.options()).await?;
    let rendered = templar.render_file("a.tpl", &Value::Null).await?;

    assert_eq!(rendered, "x+x");
    Ok(())
}
