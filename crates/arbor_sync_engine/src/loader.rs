//! The tree synchronization engine: a predicate-filtered, depth-first
//! walker that converges the live tree to the serialized desired state.

use crate::consistency::ConsistencyChecker;
use crate::error::{SyncError, SyncResult};
use crate::evaluator::Evaluator;
use crate::logger::SyncLogger;
use crate::oracle::InclusionOracle;
use crate::orphans::OrphanSet;
use crate::retry::RetryQueue;
use arbor_model::{well_known, LiveNode, NodeId};
use arbor_store::{LiveStore, SerializedNode};
use std::sync::Arc;
use std::time::Instant;

/// Why an item was skipped instead of reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The inclusion oracle excluded the item.
    Excluded,
    /// The serialized reference exists but its data is missing on disk.
    MissingData,
}

/// Outcome of loading one serialized item.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The item was reconciled; carries the resulting live node, or `None`
    /// when the evaluator produced nothing and no node pre-existed.
    Loaded(Option<LiveNode>),
    /// The item was skipped. Skipped is not deleted: a skipped item never
    /// becomes an orphan.
    Skipped(SkipReason),
}

/// Mutable state threaded through one walk.
struct WalkContext<'a> {
    retry: &'a mut RetryQueue,
    /// Absent during retry replay: replayed items were already recorded on
    /// their first attempt.
    checker: Option<&'a mut dyn ConsistencyChecker>,
    processed: u64,
}

/// Orchestrates the recursive reconciliation walk.
///
/// The walk is single-threaded and depth-first; child subtrees are
/// processed strictly in sequence, type-definition content first. Failures
/// are isolated at the smallest scope that preserves sibling progress and
/// deferred into the [`RetryQueue`]; the only errors that unwind the whole
/// call are consistency violations and orphan-handling failures.
///
/// The walk recurses once per tree level, so stack use grows with the
/// height of the serialized tree. Content trees are shallow in practice;
/// callers feeding unusually deep trees should raise the thread's stack
/// size.
pub struct TreeSyncEngine<S: LiveStore> {
    store: Arc<S>,
    evaluator: Arc<dyn Evaluator>,
    inclusion: Arc<dyn InclusionOracle>,
    logger: Arc<dyn SyncLogger>,
}

impl<S: LiveStore> TreeSyncEngine<S> {
    /// Creates a sync engine over a live store and its collaborators.
    pub fn new(
        store: Arc<S>,
        evaluator: Arc<dyn Evaluator>,
        inclusion: Arc<dyn InclusionOracle>,
        logger: Arc<dyn SyncLogger>,
    ) -> Self {
        Self {
            store,
            evaluator,
            inclusion,
            logger,
        }
    }

    /// Loads one serialized tree, converging the live tree beneath it.
    ///
    /// Reconciles the root via the item merge path, then walks the tree
    /// level by level. A consistency violation aborts the entire call; any
    /// other failure is queued on `retry` for a later
    /// [`load_all`](TreeSyncEngine::load_all) replay and the walk
    /// continues with siblings.
    pub fn load_tree(
        &self,
        root: &Arc<dyn SerializedNode>,
        retry: &mut RetryQueue,
        checker: &mut dyn ConsistencyChecker,
    ) -> SyncResult<()> {
        let mut ctx = WalkContext {
            retry,
            checker: Some(checker),
            processed: 0,
        };
        self.load_tree_inner(root, &mut ctx)
    }

    /// Loads every root in order, then replays queued retries exactly once
    /// and signals completion per partition.
    ///
    /// Change notifications are paused for the whole batch so external
    /// listeners do not react to the sync's own writes. `on_root_loaded`
    /// is invoked after each root finishes. Item-level retry entries
    /// replay via direct reconciliation; tree-level entries via a full
    /// recursive re-walk of the failed subtree. Entries still failing
    /// after the replay surface through the logger.
    pub fn load_all(
        &self,
        roots: &[Arc<dyn SerializedNode>],
        retry: &mut RetryQueue,
        checker: &mut dyn ConsistencyChecker,
        mut on_root_loaded: Option<&mut dyn FnMut(&dyn SerializedNode)>,
    ) -> SyncResult<()> {
        let _batch = self.store.pause_notifications();

        {
            let mut ctx = WalkContext {
                retry: &mut *retry,
                checker: Some(checker),
                processed: 0,
            };
            for root in roots {
                self.load_tree_inner(root, &mut ctx)?;
                if let Some(callback) = on_root_loaded.as_deref_mut() {
                    callback(root.as_ref());
                }
            }
        }

        self.replay(retry)?;

        let mut partitions: Vec<&str> = Vec::new();
        for root in roots {
            if !partitions.contains(&root.partition()) {
                partitions.push(root.partition());
            }
        }
        for partition in partitions {
            self.store.deserialization_complete(partition);
        }
        Ok(())
    }

    fn load_tree_inner(
        &self,
        root: &Arc<dyn SerializedNode>,
        ctx: &mut WalkContext<'_>,
    ) -> SyncResult<()> {
        let started = Instant::now();
        let before = ctx.processed;
        self.logger.tree_begin(root.path());

        // The root itself loads via the merge path before the walk. An
        // excluded root ends the tree here: children of an excluded node
        // are never visited.
        match self.do_load_item(root.as_ref(), ctx) {
            Ok(LoadOutcome::Skipped(SkipReason::Excluded)) => {
                self.logger
                    .tree_end(root.path(), ctx.processed - before, started.elapsed());
                return Ok(());
            }
            Ok(_) => {}
            Err(error) if error.propagates() => return Err(error),
            Err(error) => ctx.retry.push_item(Arc::clone(root), error),
        }
        self.load_tree_recursive(root, ctx)?;

        self.logger
            .tree_end(root.path(), ctx.processed - before, started.elapsed());
        Ok(())
    }

    fn load_tree_recursive(
        &self,
        node: &Arc<dyn SerializedNode>,
        ctx: &mut WalkContext<'_>,
    ) -> SyncResult<()> {
        let verdict = self.inclusion.includes_serialized(node.as_ref());
        if !verdict.included {
            // Children of an excluded node are never visited. The skip was
            // already reported when this node loaded as part of its
            // parent's level.
            return Ok(());
        }

        // One bad subtree never blocks its siblings: level failures are
        // captured as tree-level retries and the caller moves on.
        match self.load_one_level(node, ctx) {
            Ok(()) => {}
            Err(error) if error.propagates() => return Err(error),
            Err(error) => {
                ctx.retry.push_tree(Arc::clone(node), error);
                return Ok(());
            }
        }

        let mut children = match node.children() {
            Ok(children) => children,
            Err(error) => {
                ctx.retry.push_tree(Arc::clone(node), error.into());
                return Ok(());
            }
        };

        // Type-definition content is created before content that depends
        // on it, to avoid spurious structural-prerequisite failures.
        if children.len() > 1 {
            if let Some(pos) = children
                .iter()
                .position(|child| well_known::is_templates_segment(child.path().leaf()))
            {
                if pos > 0 {
                    let templates = children.remove(pos);
                    children.insert(0, templates);
                }
            }
        }

        for child in &children {
            self.load_tree_recursive(child, ctx)?;
        }

        // A defaults record whose type sibling failed first can succeed
        // now that the level is complete.
        for entry in ctx.retry.take_prerequisites(node.id()) {
            match self.do_load_item(entry.node.as_ref(), ctx) {
                Ok(_) => {}
                Err(error) if error.propagates() => return Err(error),
                Err(error) => ctx.retry.push_item(entry.node, error),
            }
        }
        Ok(())
    }

    /// Reconciles the children of `node` and judges orphans among the
    /// corresponding live children.
    fn load_one_level(
        &self,
        node: &Arc<dyn SerializedNode>,
        ctx: &mut WalkContext<'_>,
    ) -> SyncResult<()> {
        let Some(item) = node.item()? else {
            // Already reported as missing when this node itself loaded.
            return Ok(());
        };

        let mut orphans = OrphanSet::new();
        if self.store.node(&item.partition, item.id)?.is_some() {
            self.collect_orphan_candidates(&item.partition, item.id, &mut orphans)?;
        }

        for child in node.children()? {
            if well_known::is_defaults_name(child.path().leaf()) {
                // Structure-definition records are never deletion
                // candidates; they reconcile after the rest of the level.
                orphans.remove(child.id());
                ctx.retry.push_prerequisite(node.id(), child);
                continue;
            }

            match self.do_load_item(child.as_ref(), ctx) {
                Ok(LoadOutcome::Loaded(loaded)) => {
                    let loaded_id = loaded.as_ref().map(|n| n.id).unwrap_or_else(|| child.id());
                    orphans.remove(loaded_id);
                    if loaded.is_none() {
                        // The evaluator produced nothing and no live node
                        // pre-existed, so there is nothing to judge below.
                        continue;
                    }
                    match child.children() {
                        Ok(grandchildren) if grandchildren.is_empty() => {
                            // The walk only descends where serialized
                            // children exist; live children below this
                            // point are judged here or never.
                            self.collect_orphan_candidates(
                                &item.partition,
                                loaded_id,
                                &mut orphans,
                            )?;
                        }
                        Ok(_) => {}
                        Err(error) => ctx.retry.push_item(child, error.into()),
                    }
                }
                Ok(LoadOutcome::Skipped(_)) => {
                    // Skipped is not deleted.
                    orphans.remove(child.id());
                }
                Err(error) if error.propagates() => return Err(error),
                Err(error) => {
                    // Errors never cause deletion.
                    orphans.remove(child.id());
                    ctx.retry.push_item(child, error);
                }
            }
        }

        if !orphans.is_empty() {
            let candidates = orphans.commit();
            self.logger.orphans_detected(node.path(), &candidates);
            // The evaluator's own mutations while handling orphans must
            // not re-trigger the sync pipeline.
            let _feedback = self.store.suppress_feedback();
            self.evaluator
                .evaluate_orphans(&candidates)
                .map_err(|error| SyncError::OrphanHandling {
                    path: node.path().clone(),
                    source: Box::new(error),
                })?;
        }
        Ok(())
    }

    fn collect_orphan_candidates(
        &self,
        partition: &str,
        parent: NodeId,
        orphans: &mut OrphanSet,
    ) -> SyncResult<()> {
        for live_child in self.store.children(partition, parent)? {
            if live_child.is_defaults_record() {
                continue;
            }
            let verdict = self.inclusion.includes_live(&live_child);
            if verdict.included {
                orphans.insert(live_child);
            } else {
                self.logger
                    .skipped_excluded(&live_child.path, verdict.justification.as_deref());
            }
        }
        Ok(())
    }

    /// Reconciles one serialized item through the evaluator.
    fn do_load_item(
        &self,
        node: &dyn SerializedNode,
        ctx: &mut WalkContext<'_>,
    ) -> SyncResult<LoadOutcome> {
        let Some(item) = node.item()? else {
            self.logger.skipped_missing(node.path());
            return Ok(LoadOutcome::Skipped(SkipReason::MissingData));
        };

        if let Some(checker) = ctx.checker.as_deref_mut() {
            checker.check(&item)?;
        }

        // Held across inclusion check through evaluation; restored on
        // every exit path.
        let _feedback = self.store.suppress_feedback();

        let verdict = self.inclusion.includes_serialized(node);
        if !verdict.included {
            self.logger
                .skipped_excluded(node.path(), verdict.justification.as_deref());
            return Ok(LoadOutcome::Skipped(SkipReason::Excluded));
        }

        let existing = self.store.node(&item.partition, item.id)?;
        let produced = match &existing {
            None => self.evaluator.evaluate_new(&item)?,
            Some(live) => self.evaluator.evaluate_update(&item, live)?,
        };
        ctx.processed += 1;
        Ok(LoadOutcome::Loaded(produced.or(existing)))
    }

    /// The single deferred replay pass. Entries that fail again surface
    /// through the logger and are not re-queued.
    fn replay(&self, retry: &mut RetryQueue) -> SyncResult<()> {
        if retry.is_empty() {
            return Ok(());
        }
        let (items, trees, mut prerequisites) = retry.drain();

        // Tree-level entries re-walk their whole subtree. New failures
        // inside the re-walk land in a scratch queue and are reported,
        // never replayed again.
        let mut rewalk_failures = RetryQueue::new();
        {
            let mut ctx = WalkContext {
                retry: &mut rewalk_failures,
                checker: None,
                processed: 0,
            };
            for entry in trees {
                self.load_tree_recursive(&entry.node, &mut ctx)?;
            }
        }
        let (rewalk_items, rewalk_trees, rewalk_prerequisites) = rewalk_failures.drain();
        for entry in rewalk_items {
            self.logger.retry_failed(entry.node.path(), &entry.error);
        }
        for entry in rewalk_trees {
            self.logger.retry_failed(entry.node.path(), &entry.error);
        }
        prerequisites.extend(rewalk_prerequisites);

        // Item-level entries, plus prerequisites stranded by aborted
        // levels, replay via direct reconciliation.
        let mut sink = RetryQueue::new();
        let mut ctx = WalkContext {
            retry: &mut sink,
            checker: None,
            processed: 0,
        };
        let stranded = items
            .into_iter()
            .map(|entry| entry.node)
            .chain(prerequisites.into_iter().map(|entry| entry.node));
        for node in stranded {
            match self.do_load_item(node.as_ref(), &mut ctx) {
                Ok(_) => {}
                Err(error) if error.propagates() => return Err(error),
                Err(error) => self.logger.retry_failed(node.path(), &error),
            }
        }
        Ok(())
    }
}
