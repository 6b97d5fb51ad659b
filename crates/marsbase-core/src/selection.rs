//! Task selection for idle workers.
//!
//! Candidates come from two places: worker-scoped meta tasks scored for the
//! worker, and settlement jobs on the [`JobBoard`] re-scored for the worker.
//! One weighted draw picks the winner. Probabilities follow the scores;
//! zero-score candidates can never win.

use marsbase_logic::selection::weighted_pick;

use crate::meta::{JobKind, MetaContext, MetaTaskRegistry, MetaTaskScope, TaskJob, WorkerView};
use crate::task::{Task, TaskContext};

#[derive(Debug, Clone)]
struct BoardEntry {
    job: TaskJob,
    consumed: bool,
}

/// Settlement-level jobs for the current pulse. Each job goes to at most
/// one worker.
#[derive(Debug, Clone, Default)]
pub struct JobBoard {
    entries: Vec<BoardEntry>,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the board with fresh jobs from every settlement-scoped meta.
    pub fn refresh(&mut self, registry: &MetaTaskRegistry, ctx: &MetaContext) {
        self.entries.clear();
        for meta in registry
            .iter()
            .filter(|m| m.scope() == MetaTaskScope::Settlement)
        {
            self.entries.extend(
                meta.settlement_jobs(ctx)
                    .into_iter()
                    .filter(|job| job.score > 0.0)
                    .map(|job| BoardEntry {
                        job,
                        consumed: false,
                    }),
            );
        }
        if !self.entries.is_empty() {
            log::debug!("Job board holds {} settlement jobs", self.entries.len());
        }
    }

    /// Unconsumed jobs with their board index.
    pub fn available(&self) -> impl Iterator<Item = (usize, &TaskJob)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.consumed)
            .map(|(i, e)| (i, &e.job))
    }

    /// Mark a job taken. Returns false if it was already taken.
    pub fn consume(&mut self, index: usize) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) if !entry.consumed => {
                entry.consumed = true;
                true
            }
            _ => false,
        }
    }

    pub fn available_count(&self) -> usize {
        self.available().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Worker(JobKind),
    Board(usize, JobKind),
}

pub struct SelectionEngine<'r> {
    registry: &'r MetaTaskRegistry,
}

impl<'r> SelectionEngine<'r> {
    pub fn new(registry: &'r MetaTaskRegistry) -> Self {
        Self { registry }
    }

    /// Pick and create a task for `ctx.worker`. `None` means nothing scored
    /// above zero and the worker idles.
    pub fn select(&self, ctx: &mut TaskContext, board: &mut JobBoard) -> Option<Task> {
        let view = match WorkerView::read(ctx.world, ctx.worker) {
            Ok(view) => view,
            Err(e) => {
                log::warn!("Cannot select a task for {:?}: {}", ctx.worker, e);
                return None;
            }
        };
        let meta_ctx = MetaContext::new(
            ctx.world,
            ctx.directory,
            ctx.status,
            ctx.config,
            ctx.occupancy,
            ctx.pulse.time,
        );

        let mut sources = Vec::new();
        let mut scores = Vec::new();
        for meta in self.registry.iter().filter(|m| m.is_eligible(&view)) {
            if meta.scope() != MetaTaskScope::Worker {
                continue;
            }
            for job in meta.worker_jobs(&view, &meta_ctx, ctx.rng) {
                if job.score > 0.0 {
                    sources.push(Source::Worker(job.kind));
                    scores.push(job.score);
                }
            }
        }
        for (index, job) in board.available() {
            let Some(meta) = self.registry.find(job.meta) else {
                continue;
            };
            if !meta.is_eligible(&view) {
                continue;
            }
            let score = meta.score_settlement_job(job, &view, &meta_ctx);
            if score > 0.0 {
                sources.push(Source::Board(index, job.kind));
                scores.push(score);
            }
        }

        let chosen = weighted_pick(&scores, ctx.rng)?;
        let kind = match sources[chosen] {
            Source::Worker(kind) => kind,
            Source::Board(index, kind) => {
                board.consume(index);
                kind
            }
        };
        let task = kind.create(ctx);
        log::debug!("{} selected {} ({})", view.id, task.name(), task.description());
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingKind, JobType, Maintenance, RoboticStation, Station};
    use crate::facilities::Occupancy;
    use crate::task::test_support::Fixture;

    fn worn(fx: &mut Fixture) -> crate::components::BuildingId {
        let mut m = Maintenance::new(0.01, 60.0);
        m.condition = 20.0;
        fx.building(BuildingKind::Garage, (m,))
    }

    #[test]
    fn board_jobs_consumed_once() {
        let mut fx = Fixture::new();
        worn(&mut fx);
        let registry = MetaTaskRegistry::from_names(["maintenance"]);
        let mut board = JobBoard::new();
        let status = fx.status;
        let occupancy = Occupancy::count(&fx.world);
        let ctx = MetaContext::new(
            &fx.world,
            &fx.directory,
            &status,
            &fx.config,
            &occupancy,
            fx.pulse.time,
        );
        board.refresh(&registry, &ctx);

        assert_eq!(board.available_count(), 1);
        assert!(board.consume(0));
        assert!(!board.consume(0));
        assert_eq!(board.available_count(), 0);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn idle_when_nothing_scores() {
        let mut fx = Fixture::new();
        let robot = fx.robot(95.0, None);
        let registry = MetaTaskRegistry::standard();
        let mut board = JobBoard::new();
        let engine = SelectionEngine::new(&registry);
        assert!(engine.select(&mut fx.ctx(robot), &mut board).is_none());
    }

    #[test]
    fn low_robot_selects_charge() {
        let mut fx = Fixture::new();
        let garage = fx.building(
            BuildingKind::Garage,
            (RoboticStation {
                slots: Station::new(1),
            },),
        );
        let robot = fx.robot(30.0, Some(garage));
        let registry = MetaTaskRegistry::standard();
        let mut board = JobBoard::new();
        let engine = SelectionEngine::new(&registry);

        let task = engine.select(&mut fx.ctx(robot), &mut board).unwrap();
        assert_eq!(task.name(), "Charge");
        assert!(!task.is_done());
    }

    #[test]
    fn mechanic_takes_board_job() {
        let mut fx = Fixture::new();
        let b = worn(&mut fx);
        let engineer = fx.person(JobType::Engineer, Some(b));
        let registry = MetaTaskRegistry::from_names(["maintenance"]);
        let mut board = JobBoard::new();
        let status = fx.status;
        {
            let occupancy = Occupancy::count(&fx.world);
            let ctx = MetaContext::new(
                &fx.world,
                &fx.directory,
                &status,
                &fx.config,
                &occupancy,
                fx.pulse.time,
            );
            board.refresh(&registry, &ctx);
        }

        let engine = SelectionEngine::new(&registry);
        let task = engine.select(&mut fx.ctx(engineer), &mut board).unwrap();
        assert_eq!(task.name(), "Maintain");
        assert_eq!(board.available_count(), 0);
    }
}
