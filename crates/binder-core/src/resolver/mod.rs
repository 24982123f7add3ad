//! Deterministic resolver: criteria + catalog snapshot → candidate (cluster, command) pairs.
//!
//! Algorithm, for each cluster criterion in declared order:
//! - keep usable clusters matching the criterion;
//! - for each, keep its usable attached commands matching the command criterion;
//! - across all qualifying pairs keep those with the minimum per-cluster priority;
//! - the first criterion yielding a non-empty set wins.
//!
//! Candidates are ordered by `(cluster id, command id)`; the first one is the default choice.
mod error;
pub use error::ResolveError;

use std::collections::BTreeMap;

use binder_model::{Cluster, Command, Criterion, ExecutionResourceCriteria, Priority};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::catalog::Catalog;

/// A (cluster, command) pair that survived deterministic filtering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub cluster: Cluster,
    pub command: Command,
    pub priority: Priority,
}

/// Result of a successful deterministic resolution.
///
/// `candidates` is never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    criterion_index: usize,
    criterion: Criterion,
    candidates: Vec<Candidate>,
}

impl Resolution {
    /// Index of the cluster criterion that produced the candidates.
    pub fn criterion_index(&self) -> usize {
        self.criterion_index
    }

    pub fn criterion(&self) -> &Criterion {
        &self.criterion
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Deterministic choice: the first candidate in `(cluster id, command id)` order.
    pub fn default_candidate(&self) -> &Candidate {
        &self.candidates[0]
    }

    /// Distinct commands of the candidate set, ordered by command id.
    pub fn commands(&self) -> Vec<Command> {
        self.command_clusters()
            .into_values()
            .filter_map(|pairs| pairs.first().map(|c| c.command.clone()))
            .collect()
    }

    /// Clusters paired with `command_id`, ordered by cluster id.
    pub fn clusters_for(&self, command_id: &str) -> Vec<Cluster> {
        self.candidates
            .iter()
            .filter(|c| c.command.id == command_id)
            .map(|c| c.cluster.clone())
            .collect()
    }

    /// Command id → clusters paired with it.
    pub fn clusters_by_command(&self) -> BTreeMap<String, Vec<Cluster>> {
        self.command_clusters()
            .into_iter()
            .map(|(id, pairs)| (id, pairs.into_iter().map(|c| c.cluster.clone()).collect()))
            .collect()
    }

    fn command_clusters(&self) -> BTreeMap<String, Vec<&Candidate>> {
        let mut out: BTreeMap<String, Vec<&Candidate>> = BTreeMap::new();
        for c in &self.candidates {
            out.entry(c.command.id.clone()).or_default().push(c);
        }
        out
    }
}

/// Resolve `criteria` against a catalog snapshot.
///
/// Pure with respect to the snapshot: the same catalog and criteria always yield the
/// same [`Resolution`].
#[instrument(
    level = "debug",
    skip_all,
    fields(cluster_criteria = criteria.cluster_criteria().len(), command = %criteria.command_criterion())
)]
pub fn resolve(
    criteria: &ExecutionResourceCriteria,
    catalog: &dyn Catalog,
) -> Result<Resolution, ResolveError> {
    let command_criterion = criteria.command_criterion();

    if !catalog
        .usable_commands()
        .iter()
        .any(|c| command_criterion.matches(c))
    {
        debug!("command criterion unsatisfiable, skipping cluster criteria");
        return Err(ResolveError::CommandNotFound {
            criterion: command_criterion.clone(),
        });
    }

    let clusters = catalog.usable_clusters();

    for (index, criterion) in criteria.cluster_criteria().iter().enumerate() {
        let mut best: Option<Priority> = None;
        let mut candidates = Vec::new();

        for cluster in clusters.iter().filter(|c| criterion.matches(*c)) {
            for (command, priority) in catalog.usable_cluster_commands(&cluster.id) {
                if !command_criterion.matches(&command) {
                    continue;
                }
                match best {
                    Some(b) if priority > b => continue,
                    Some(b) if priority == b => {}
                    _ => {
                        best = Some(priority);
                        candidates.clear();
                    }
                }
                candidates.push(Candidate {
                    cluster: cluster.clone(),
                    command,
                    priority,
                });
            }
        }

        if candidates.is_empty() {
            trace!(index, %criterion, "cluster criterion unsatisfied");
            continue;
        }

        candidates.sort_by(|a, b| {
            (a.cluster.id.as_str(), a.command.id.as_str())
                .cmp(&(b.cluster.id.as_str(), b.command.id.as_str()))
        });
        candidates.dedup_by(|a, b| a.cluster.id == b.cluster.id && a.command.id == b.command.id);

        debug!(
            index,
            %criterion,
            candidates = candidates.len(),
            priority = best,
            "cluster criterion satisfied"
        );
        return Ok(Resolution {
            criterion_index: index,
            criterion: criterion.clone(),
            candidates,
        });
    }

    Err(ResolveError::ResourceNotFound {
        unsatisfied: criteria.cluster_criteria().to_vec(),
        command: command_criterion.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use binder_model::{ClusterStatus, CommandStatus};

    fn tags(t: &[&str]) -> Criterion {
        Criterion::with_tags(t.iter().copied()).unwrap()
    }

    fn criteria(clusters: &[&[&str]], command: &[&str]) -> ExecutionResourceCriteria {
        ExecutionResourceCriteria::new(
            clusters.iter().map(|t| tags(t)).collect(),
            tags(command),
            Vec::new(),
        )
        .unwrap()
    }

    fn spark() -> Command {
        Command::new("spark", "spark", "3.5", CommandStatus::Active).with_tags(["spark"])
    }

    #[test]
    fn first_satisfiable_criterion_wins() {
        let cat = InMemoryCatalog::new(
            vec![
                Cluster::new("x", "x", "1", ClusterStatus::Up)
                    .with_tags(["gpu", "prod"])
                    .with_command("spark", 0),
                Cluster::new("y", "y", "1", ClusterStatus::Up)
                    .with_tags(["prod"])
                    .with_command("spark", 0),
            ],
            vec![spark()],
            Vec::new(),
        );

        let res = resolve(&criteria(&[&["gpu"], &["prod"]], &["spark"]), &cat).unwrap();
        assert_eq!(res.criterion_index(), 0);
        let ids: Vec<_> = res.candidates().iter().map(|c| c.cluster.id.as_str()).collect();
        assert_eq!(ids, vec!["x"]);
    }

    #[test]
    fn falls_through_to_later_criteria() {
        let cat = InMemoryCatalog::new(
            vec![
                Cluster::new("y", "y", "1", ClusterStatus::Up)
                    .with_tags(["prod"])
                    .with_command("spark", 0),
            ],
            vec![spark()],
            Vec::new(),
        );

        let res = resolve(&criteria(&[&["gpu"], &["prod"]], &["spark"]), &cat).unwrap();
        assert_eq!(res.criterion_index(), 1);
        assert_eq!(res.default_candidate().cluster.id, "y");
    }

    #[test]
    fn keeps_only_minimum_priority_pairs() {
        let cat = InMemoryCatalog::new(
            vec![
                Cluster::new("a", "a", "1", ClusterStatus::Up)
                    .with_tags(["prod"])
                    .with_command("spark", 5),
                Cluster::new("b", "b", "1", ClusterStatus::Up)
                    .with_tags(["prod"])
                    .with_command("spark", 2)
                    .with_command("spark-next", 2),
            ],
            vec![
                spark(),
                Command::new("spark-next", "spark", "4.0", CommandStatus::Active)
                    .with_tags(["spark"]),
            ],
            Vec::new(),
        );

        let res = resolve(&criteria(&[&["prod"]], &["spark"]), &cat).unwrap();
        let pairs: Vec<_> = res
            .candidates()
            .iter()
            .map(|c| (c.cluster.id.as_str(), c.command.id.as_str(), c.priority))
            .collect();
        assert_eq!(pairs, vec![("b", "spark", 2), ("b", "spark-next", 2)]);
        assert_eq!(res.commands().len(), 2);
        assert_eq!(res.clusters_for("spark-next").len(), 1);
    }

    #[test]
    fn unusable_clusters_never_match() {
        let cat = InMemoryCatalog::new(
            vec![
                Cluster::new("down", "down", "1", ClusterStatus::Terminated)
                    .with_tags(["prod"])
                    .with_command("spark", 0),
            ],
            vec![spark()],
            Vec::new(),
        );

        let err = resolve(&criteria(&[&["prod"]], &["spark"]), &cat).unwrap_err();
        assert!(matches!(err, ResolveError::ResourceNotFound { .. }));
    }

    #[test]
    fn explicit_status_must_still_be_usable() {
        let cat = InMemoryCatalog::new(
            vec![
                Cluster::new("oos", "oos", "1", ClusterStatus::OutOfService)
                    .with_command("spark", 0),
            ],
            vec![spark()],
            Vec::new(),
        );
        let c = Criterion::builder().status("outOfService").build().unwrap();
        let crit = ExecutionResourceCriteria::new(vec![c], tags(&["spark"]), Vec::new()).unwrap();
        assert!(resolve(&crit, &cat).is_err());
    }

    #[test]
    fn command_first_short_circuit_names_command_criterion() {
        let cat = InMemoryCatalog::new(
            vec![
                Cluster::new("x", "x", "1", ClusterStatus::Up)
                    .with_tags(["prod"])
                    .with_command("spark", 0),
            ],
            vec![spark()],
            Vec::new(),
        );

        let err = resolve(&criteria(&[&["prod"]], &["flink"]), &cat).unwrap_err();
        match err {
            ResolveError::CommandNotFound { criterion } => {
                assert!(criterion.tags().contains("flink"));
            }
            other => panic!("expected CommandNotFound, got {other:?}"),
        }
    }

    #[test]
    fn not_found_lists_every_unsatisfied_criterion() {
        let cat = InMemoryCatalog::new(
            vec![
                Cluster::new("x", "x", "1", ClusterStatus::Up)
                    .with_tags(["prod"])
                    .with_command("spark", 0),
            ],
            vec![spark()],
            Vec::new(),
        );

        let err = resolve(&criteria(&[&["gpu"], &["arm"]], &["spark"]), &cat).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("tags=[gpu]"), "{msg}");
        assert!(msg.contains("tags=[arm]"), "{msg}");
    }
}
