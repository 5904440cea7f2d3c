//! Deduplication and reference-rewriting engine (§4.8, C8).
//!
//! Groups objects of one kind by normalized value, picks a survivor per
//! class with a [`SurvivorStrategy`], rewrites every reference site found
//! by `panflow-graph`'s reference index, and deletes the duplicates. A
//! class either rewrites completely or is skipped whole — sites are
//! validated before any mutation in that class is applied.

mod equivalence;
mod rewrite;
mod survivor;

pub use equivalence::{build_classes, Candidate, EquivalenceClass};
pub use rewrite::RewriteOutcome;
pub use survivor::select_survivor;

use panflow_accessors::Accessors;
use panflow_graph::{find_references, ConfigGraph};
use panflow_model::{AbortFlag, Action, ChangeRecord, ContextDescriptor, EntityKind, Journal, ObjectKind, Result, SurvivorStrategy};
use panflow_tree::Tree;

/// One dedup invocation's parameters (§4.8 input).
pub struct DedupRequest {
    pub kind: ObjectKind,
    /// Contexts to scan, ordered leaf-to-root. A flat, single-context
    /// dedup passes one element; the hierarchical variant passes the
    /// device-group chain ending in `shared` (see
    /// [`panflow_graph::visible_contexts`]).
    pub scope: Vec<ContextDescriptor>,
    pub strategy: SurvivorStrategy,
    pub dry_run: bool,
}

pub struct DedupEngine<'a> {
    accessors: &'a Accessors<'a>,
    abort: AbortFlag,
}

impl<'a> DedupEngine<'a> {
    pub fn new(accessors: &'a Accessors<'a>, abort: AbortFlag) -> Self {
        Self { accessors, abort }
    }

    /// Runs one dedup pass. `graph` must reflect `tree`'s current state;
    /// the caller rebuilds it after any prior mutation (§4.5: the graph
    /// does not self-invalidate).
    pub fn run(&self, tree: &mut Tree, graph: &ConfigGraph, request: &DedupRequest) -> Result<Journal> {
        let mut journal = Journal::new();
        let classes = build_classes(tree, self.accessors, graph, request.kind, &request.scope)?;
        tracing::debug!(kind = %request.kind, classes = classes.len(), dry_run = request.dry_run, "dedup pass starting");

        for class in classes {
            if self.abort.is_set() {
                tracing::warn!(kind = %request.kind, "dedup pass aborted before completion");
                break;
            }
            self.process_class(tree, graph, request, &class, &mut journal)?;
        }

        tracing::info!(kind = %request.kind, changes = journal.entries().len(), dry_run = request.dry_run, "dedup pass complete");
        Ok(journal)
    }

    fn process_class(
        &self,
        tree: &mut Tree,
        graph: &ConfigGraph,
        request: &DedupRequest,
        class: &EquivalenceClass,
        journal: &mut Journal,
    ) -> Result<()> {
        let survivor_idx = select_survivor(&class.members, request.strategy);
        let survivor = &class.members[survivor_idx];

        let mut plan = Vec::new();
        for (idx, duplicate) in class.members.iter().enumerate() {
            if idx == survivor_idx {
                continue;
            }
            let sites = find_references(graph, EntityKind::Object(request.kind), &duplicate.name, &duplicate.context)?;
            for site in &sites {
                if let Err(err) = rewrite::locate(tree, site, &duplicate.name) {
                    journal.record(ChangeRecord::skipped(
                        request.kind.as_str(),
                        duplicate.name.as_str(),
                        duplicate.context.label(),
                        format!("class for value '{}' skipped: {err}", class.value),
                    ));
                    return Ok(());
                }
            }
            plan.push((duplicate, sites));
        }

        if request.dry_run {
            for (duplicate, sites) in &plan {
                for site in sites {
                    journal.record(
                        ChangeRecord::new(Action::ReplaceRef, request.kind.as_str(), site.name.as_str(), site.context.label())
                            .with_before(duplicate.name.clone())
                            .with_after(survivor.name.clone()),
                    );
                }
                journal.record(
                    ChangeRecord::new(Action::Delete, request.kind.as_str(), duplicate.name.clone(), duplicate.context.label())
                        .with_reason(format!("duplicate of '{}' (value '{}')", survivor.name, class.value)),
                );
            }
            return Ok(());
        }

        for (duplicate, sites) in &plan {
            for site in sites {
                let outcome = rewrite::apply(tree, site, &duplicate.name, &survivor.name)?;
                let record = match outcome {
                    RewriteOutcome::Replaced => {
                        ChangeRecord::new(Action::ReplaceRef, request.kind.as_str(), site.name.as_str(), site.context.label())
                            .with_before(duplicate.name.clone())
                            .with_after(survivor.name.clone())
                    }
                    RewriteOutcome::Dropped => {
                        ChangeRecord::new(Action::Update, request.kind.as_str(), site.name.as_str(), site.context.label())
                            .with_reason(format!("member '{}' dropped; survivor '{}' already present", duplicate.name, survivor.name))
                    }
                };
                journal.record(record);
            }
            self.accessors.delete(tree, request.kind.as_str(), &duplicate.context, &duplicate.name)?;
            journal.record(ChangeRecord::new(
                Action::Delete,
                request.kind.as_str(),
                duplicate.name.clone(),
                duplicate.context.label(),
            ));
        }

        Ok(())
    }
}
