//! Preload policy
//!
//! Decides, before execution, whether a request should fetch every table up
//! front through [`Loaders::preload_all`](super::loaders::Loaders::preload_all)
//! instead of relying on per-batch loading. The decision only changes how
//! many store calls a request makes, never what it answers.

use std::collections::HashSet;

use async_graphql::parser::{
    parse_query,
    types::{ExecutableDocument, OperationType, Selection, SelectionSet},
};

use crate::config::{Config, PreloadMode};

/// Root fields that return whole tables
pub const LIST_FIELDS: [&str; 5] = ["users", "posts", "profiles", "memberTypes", "subscriptions"];

/// User fields that walk the subscription graph
const SUBSCRIPTION_FIELDS: [&str; 2] = ["userSubscribedTo", "subscribedToUser"];

/// When to preload for an incoming request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadPolicy {
    pub mode: PreloadMode,
    /// Distinct root list fields that trigger an `auto` preload
    pub min_list_fields: usize,
}

impl Default for PreloadPolicy {
    fn default() -> Self {
        Self {
            mode: PreloadMode::Auto,
            min_list_fields: 2,
        }
    }
}

impl PreloadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.preload_mode,
            min_list_fields: config.preload_min_list_fields,
        }
    }

    /// Whether to preload for `query`
    ///
    /// Mutations and documents that fail to parse never preload; the latter
    /// are rejected by validation anyway.
    pub fn should_preload(&self, query: &str, operation_name: Option<&str>) -> bool {
        if self.mode == PreloadMode::Never {
            return false;
        }

        let document = match parse_query(query) {
            Ok(document) => document,
            Err(_) => return false,
        };
        let Some(root) = QueryRoot::find(&document, operation_name) else {
            return false;
        };

        match self.mode {
            PreloadMode::Never => false,
            PreloadMode::Always => true,
            PreloadMode::Auto => {
                root.list_fields().len() >= self.min_list_fields || root.users_walk_subscriptions()
            }
        }
    }
}

/// Root selection of the query operation a request will run
struct QueryRoot<'a> {
    document: &'a ExecutableDocument,
    selection_set: &'a SelectionSet,
}

impl<'a> QueryRoot<'a> {
    /// The selected operation, if it is a query
    fn find(document: &'a ExecutableDocument, operation_name: Option<&str>) -> Option<Self> {
        let operation = document
            .operations
            .iter()
            .find(|(name, _)| match operation_name {
                Some(wanted) => name.map(|n| n.as_str()) == Some(wanted),
                None => true,
            })
            .map(|(_, operation)| operation)?;

        if operation.node.ty != OperationType::Query {
            return None;
        }
        Some(Self {
            document,
            selection_set: &operation.node.selection_set.node,
        })
    }

    /// Distinct whole-table fields selected at the root
    fn list_fields(&self) -> HashSet<&'a str> {
        let mut found = HashSet::new();
        self.visit_fields(self.selection_set, &mut |name, _| {
            if LIST_FIELDS.contains(&name) {
                found.insert(name);
            }
        });
        found
    }

    /// Whether a root `users` selection reaches into subscription lists
    fn users_walk_subscriptions(&self) -> bool {
        let mut walks = false;
        self.visit_fields(self.selection_set, &mut |name, selection_set| {
            if name == "users" {
                self.visit_fields(selection_set, &mut |child, _| {
                    if SUBSCRIPTION_FIELDS.contains(&child) {
                        walks = true;
                    }
                });
            }
        });
        walks
    }

    /// Call `f` with every field of `selection_set`, looking through
    /// fragment spreads and inline fragments
    fn visit_fields(&self, selection_set: &'a SelectionSet, f: &mut dyn FnMut(&'a str, &'a SelectionSet)) {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    f(field.node.name.node.as_str(), &field.node.selection_set.node);
                }
                Selection::InlineFragment(fragment) => {
                    self.visit_fields(&fragment.node.selection_set.node, f);
                }
                Selection::FragmentSpread(spread) => {
                    if let Some(fragment) = self.document.fragments.get(&spread.node.fragment_name.node) {
                        self.visit_fields(&fragment.node.selection_set.node, f);
                    }
                }
            }
        }
    }
}
