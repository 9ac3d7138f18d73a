//! Doc-comment attachment, decoupled from the main parse (spec §4.1).
//! The lexer emits a separate doc stream; after parsing, each *line*
//! doc attaches to the first item starting at or after the doc's end,
//! and every *module* doc lands in the file's top-level doc list.
//! Docs on `ErrorItem`s are discarded (not reassigned to the next item).

use crate::ast::{Item, ItemKind};
use crate::lexer_api::{DocComment, DocKind};

pub(super) fn attach(mut items: Vec<Item>, docs: &[DocComment]) -> (Vec<Item>, Vec<String>) {
  let mut module_docs = Vec::new();
  // Docs and items are both in source order, so a single forward cursor
  // over items finds each doc's target in amortized linear time.
  let mut item_cursor = 0usize;
  for doc in docs {
    match doc.kind {
      DocKind::Module => module_docs.push(doc.text.clone()),
      DocKind::Line => {
        while item_cursor < items.len() && items[item_cursor].span.lo < doc.span.hi {
          item_cursor += 1;
        }
        if let Some(target) = items.get_mut(item_cursor) {
          if !matches!(target.kind, ItemKind::ErrorItem) {
            target.doc.push(doc.text.clone());
          }
        }
      }
    }
  }
  (items, module_docs)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::{AttributeSet, Visibility};
  use crate::idx::Idx;
  use crate::span::{FileId, Span};

  fn sp(lo: u32, hi: u32) -> Span { Span::new(FileId::from_usize(0), lo, hi) }

  fn item_at(lo: u32, hi: u32, kind: ItemKind) -> Item {
    Item { span: sp(lo, hi), vis: Visibility::Private, attrs: AttributeSet::default(), doc: Vec::new(), kind }
  }

  fn dummy_expr() -> crate::ast::Expr {
    crate::ast::Expr { span: sp(0, 1), kind: Box::new(crate::ast::ExprKind::ErrorExpr) }
  }

  #[test]
  fn line_doc_attaches_to_first_item_at_or_after_its_end() {
    let items = vec![
      item_at(10, 20, ItemKind::Static {
        name: crate::symbol::intern("x"), mutable: false, ty: None, init: dummy_expr(),
      }),
      item_at(30, 50, ItemKind::Static {
        name: crate::symbol::intern("y"), mutable: false, ty: None, init: dummy_expr(),
      }),
    ];
    let docs = vec![DocComment { kind: DocKind::Line, text: "doc".into(), span: sp(0, 5) }];
    let (items, mods) = attach(items, &docs);
    assert!(mods.is_empty());
    assert_eq!(items[0].doc, vec!["doc".to_string()]);
    assert!(items[1].doc.is_empty());
  }

  #[test]
  fn doc_on_error_item_is_discarded_not_reassigned() {
    let items = vec![
      item_at(10, 20, ItemKind::ErrorItem),
      item_at(30, 50, ItemKind::Static {
        name: crate::symbol::intern("z"), mutable: false, ty: None, init: dummy_expr(),
      }),
    ];
    let docs = vec![DocComment { kind: DocKind::Line, text: "doc".into(), span: sp(0, 5) }];
    let (items, _) = attach(items, &docs);
    assert!(items[0].doc.is_empty());
    assert!(items[1].doc.is_empty(), "doc must not fall through to the next item");
  }
}
