//! View substitution
//!
//! Replaces references to views inside a parsed query with the views' own
//! queries, as derived tables. Tables, CTE references and table functions are
//! left alone. Every query nested anywhere in the statement is visited:
//! FROM items, joins and their constraints, projections, WHERE/HAVING,
//! GROUP BY, ORDER BY and any expression that can hold a subquery.

use crate::View;
use hashbrown::HashMap;
use ironview_common::{Error, Result};
use ironview_parser::ast::{
    Ident, ObjectName, Query, TableAlias, TableFactor, VisitMut, VisitorMut, With,
};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::trace;

/// Looks up views by schema and name
pub trait ViewResolver {
    /// Returns the loaded view `schema.name`, or None when no view has that name
    fn resolve_view(&self, schema: &str, name: &str) -> Result<Option<Arc<View>>>;
}

/// Query-scoped local views layered over another resolver.
///
/// Unqualified names are looked up among the local views first.
pub struct LocalViews<'a> {
    views: HashMap<String, Arc<View>>,
    parent: &'a dyn ViewResolver,
}

impl<'a> LocalViews<'a> {
    pub fn new(parent: &'a dyn ViewResolver) -> Self {
        LocalViews {
            views: HashMap::new(),
            parent,
        }
    }

    /// Add a local view; it must have been built with [`View::local`]
    pub fn add(&mut self, view: View) -> Result<()> {
        if !view.is_local() {
            return Err(Error::Internal(format!(
                "{} is not a local view",
                view.qualified_name()
            )));
        }
        self.views.insert(view.name().to_lowercase(), Arc::new(view));
        Ok(())
    }

    fn get(&self, name: &str) -> Option<Arc<View>> {
        self.views.get(&name.to_lowercase()).cloned()
    }
}

/// Replaces view references with derived tables
pub struct ViewSubstitutor<'a> {
    resolver: &'a dyn ViewResolver,
    local: Option<&'a LocalViews<'a>>,
    default_schema: &'a str,
    max_depth: usize,
}

impl<'a> ViewSubstitutor<'a> {
    pub fn new(resolver: &'a dyn ViewResolver, default_schema: &'a str, max_depth: usize) -> Self {
        ViewSubstitutor {
            resolver,
            local: None,
            default_schema,
            max_depth,
        }
    }

    /// Substitute over `local` views and then the local views' parent resolver
    pub fn with_local_views(
        local: &'a LocalViews<'a>,
        default_schema: &'a str,
        max_depth: usize,
    ) -> Self {
        ViewSubstitutor {
            resolver: local.parent,
            local: Some(local),
            default_schema,
            max_depth,
        }
    }

    /// Substitute every view reference in `query`, including references
    /// inside the substituted view bodies.
    ///
    /// On error `query` is left as it was.
    pub fn substitute(&self, query: &mut Query) -> Result<()> {
        let mut substituted = query.clone();
        self.walk(&mut substituted, 0)?;
        *query = substituted;
        Ok(())
    }

    fn walk(&self, query: &mut Query, depth: usize) -> Result<()> {
        let mut walker = Walker {
            substitutor: self,
            ctes: Vec::new(),
            scopes: Vec::new(),
            depth,
        };
        match query.visit(&mut walker) {
            ControlFlow::Continue(()) => Ok(()),
            ControlFlow::Break(e) => Err(e),
        }
    }

    /// Build the derived table standing in for a reference to `view`
    fn expand(&self, view: &View, alias: Option<TableAlias>, depth: usize) -> Result<TableFactor> {
        if depth >= self.max_depth {
            return Err(Error::ViewRecursionLimit(self.max_depth));
        }
        let mut body = view.query().cloned().ok_or_else(|| {
            Error::Internal(format!("view {} is not loaded", view.qualified_name()))
        })?;
        // A view body only sees its own CTEs.
        self.walk(&mut body, depth + 1)?;
        trace!(view = %view.qualified_name(), depth, "substituted view");

        let alias = alias.unwrap_or_else(|| TableAlias {
            name: Ident::new(view.name()),
            columns: Vec::new(),
        });
        Ok(TableFactor::Derived {
            lateral: false,
            subquery: Box::new(body),
            alias: Some(alias),
        })
    }

    fn lookup(&self, name: &ObjectName, ctes: &[String]) -> Result<Option<Arc<View>>> {
        match name.0.as_slice() {
            [table] => {
                let table = table.value.to_lowercase();
                if ctes.contains(&table) {
                    return Ok(None);
                }
                if let Some(view) = self.local.and_then(|local| local.get(&table)) {
                    return Ok(Some(view));
                }
                self.resolver.resolve_view(self.default_schema, &table)
            }
            [schema, table] => self
                .resolver
                .resolve_view(&schema.value.to_lowercase(), &table.value.to_lowercase()),
            _ => Ok(None),
        }
    }
}

/// One pass over a query tree at a fixed view nesting depth
struct Walker<'s, 'a> {
    substitutor: &'s ViewSubstitutor<'a>,
    /// CTE names in scope, innermost last
    ctes: Vec<String>,
    /// Per open query: its WITH clause, held aside while the body is walked,
    /// and the CTE scope length to restore
    scopes: Vec<(Option<With>, usize)>,
    depth: usize,
}

impl VisitorMut for Walker<'_, '_> {
    type Break = Error;

    /// Walks the CTE bodies here, in declaration order, so that each one
    /// sees only the CTEs it may reference. The WITH clause is detached until
    /// `post_visit_query` so the generic traversal does not walk it again.
    fn pre_visit_query(&mut self, query: &mut Query) -> ControlFlow<Self::Break> {
        let scope = self.ctes.len();
        let mut with = query.with.take();
        if let Some(with) = &mut with {
            let recursive = with.recursive;
            for cte in &mut with.cte_tables {
                let name = cte.alias.name.value.to_lowercase();
                if recursive {
                    self.ctes.push(name);
                    cte.query.visit(self)?;
                } else {
                    cte.query.visit(self)?;
                    self.ctes.push(name);
                }
            }
        }
        self.scopes.push((with, scope));
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, query: &mut Query) -> ControlFlow<Self::Break> {
        if let Some((with, scope)) = self.scopes.pop() {
            query.with = with;
            self.ctes.truncate(scope);
        }
        ControlFlow::Continue(())
    }

    fn post_visit_table_factor(&mut self, factor: &mut TableFactor) -> ControlFlow<Self::Break> {
        let TableFactor::Table {
            name,
            alias,
            args: None,
            ..
        } = factor
        else {
            return ControlFlow::Continue(());
        };
        let view = match self.substitutor.lookup(name, &self.ctes) {
            Ok(Some(view)) => view,
            Ok(None) => return ControlFlow::Continue(()),
            Err(e) => return ControlFlow::Break(e),
        };
        match self.substitutor.expand(&view, alias.take(), self.depth) {
            Ok(derived) => {
                *factor = derived;
                ControlFlow::Continue(())
            }
            Err(e) => ControlFlow::Break(e),
        }
    }
}
