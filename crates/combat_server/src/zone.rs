//! Zone host.
//!
//! Owns every unit of one zone and drives them from a single tick thread.
//! Damage resolution runs on the runtime behind each unit's
//! [`DamageProcessor`]; the tick thread only submits events and reaps the
//! workers it started.
//!
//! # Tick order
//!
//! 1. Passive core recharge
//! 2. Kills reported by damage handlers cancel the affected locks
//! 3. Engagement locks advance; locked engagements fire on their cycle
//! 4. Terrain locks advance
//! 5. Blob membership is re-evaluated against every hostile, then ticked
//! 6. Finished damage workers are reaped; a fault stops the zone

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use combat_core::components::{EntityId, Module};
use combat_core::damage::{DamageInfo, DamageProcessor, DamageTaken, DamageWorker};
use combat_core::data::{EngagementData, ScenarioData, TerrainLockData};
use combat_core::error::{CombatError, Result};
use combat_core::targeting::{Lock, LockState, LockVisitor, TerrainTarget};
use combat_core::unit::Unit;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

// =============================================================================
// Reports
// =============================================================================

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Damage events submitted.
    pub shots: usize,
    /// Locks that reached `Locked`.
    pub locks_completed: usize,
    /// Units destroyed since the previous tick.
    pub kills: Vec<EntityId>,
}

/// Outcome of a zone run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSummary {
    /// Ticks simulated.
    pub ticks: u64,
    /// Destroyed units in the order their kills were reported.
    pub kills: Vec<EntityId>,
    /// Units still alive.
    pub survivors: Vec<EntityId>,
}

// =============================================================================
// Zone state
// =============================================================================

#[derive(Debug)]
struct ZoneUnit {
    name: String,
    team: u32,
    core_recharge: f64,
    processor: DamageProcessor,
}

impl ZoneUnit {
    fn unit(&self) -> &Arc<Unit> {
        self.processor.unit()
    }
}

/// A weapon that fires at one target for as long as its lock holds.
#[derive(Debug)]
struct Engagement {
    lock: Lock,
    lock_time: Duration,
    cycle: Duration,
    cooldown: Duration,
    shot: DamageInfo,
    blob_modifier: f64,
}

impl Engagement {
    fn new(data: &EngagementData) -> Self {
        let (attacker, target) = (data.attacker, data.target);
        let mut lock = Lock::unit(attacker, target);
        lock.subscribe_changed(move |lock| {
            tracing::debug!(
                attacker,
                target,
                state = ?lock.state(),
                primary = lock.is_primary(),
                "Engagement lock changed"
            );
        });
        lock.set_primary(true);

        let shot = data
            .damages
            .iter()
            .fold(DamageInfo::new(attacker), |info, (damage_type, amount)| {
                info.with(*damage_type, *amount)
            });

        Self {
            lock,
            lock_time: Duration::from_millis(data.lock_time_ms),
            cycle: Duration::from_millis(data.cycle_ms),
            cooldown: Duration::ZERO,
            shot: if data.critical { shot.critical() } else { shot },
            blob_modifier: data.blob_modifier,
        }
    }

    /// The configured shot, reduced by the attacker's own crowd penalty.
    fn penalised_shot(&self, attacker: &Unit) -> DamageInfo {
        let blob = attacker.blob();
        let mut shot = self.shot.clone();
        for (_, amount) in &mut shot.damages {
            *amount = blob.apply_penalty(*amount, self.blob_modifier);
        }
        shot
    }

    fn involves(&self, id: EntityId) -> bool {
        self.lock.owner() == id || self.lock.unit_target() == Some(id)
    }

    fn cancel(&mut self) {
        self.lock.cancel();
        self.cooldown = Duration::ZERO;
    }
}

fn terrain_lock(data: &TerrainLockData) -> Lock {
    let mut target = TerrainTarget::new(data.location);
    target.set_terraform_type(data.terraform_type);
    target.set_direction(data.direction);
    target.set_radius(data.radius);
    target.set_falloff(data.falloff);

    let mut lock = Lock::terrain(data.owner, target);
    lock.start(Duration::from_millis(data.lock_time_ms));
    lock
}

/// Applies resolved damage to armor and reports kills to the tick thread.
fn damage_handler(
    unit: Arc<Unit>,
    kills: UnboundedSender<EntityId>,
) -> impl Fn(&DamageTaken) + Send + Sync + 'static {
    move |taken| {
        if unit.apply_damage(taken.total_damage) {
            tracing::info!(
                unit = unit.id(),
                attacker = taken.attacker,
                critical = taken.is_critical,
                "Unit destroyed"
            );
            // Receiver is gone only when the zone is being torn down.
            let _ = kills.send(unit.id());
        }
    }
}

/// Logs completed locks; terrain locks include their status packet.
struct CompletionLog;

impl LockVisitor for CompletionLog {
    fn visit_lock(&mut self, lock: &Lock) {
        tracing::info!(lock = %lock.id(), owner = lock.owner(), target = ?lock.unit_target(), "Lock completed");
    }

    fn visit_terrain_lock(&mut self, lock: &Lock, target: &TerrainTarget) {
        match lock.terrain_status().map(|status| status.to_hex()) {
            Some(Ok(status)) => tracing::info!(
                lock = %lock.id(),
                owner = lock.owner(),
                radius = target.radius(),
                %status,
                "Terrain lock completed"
            ),
            Some(Err(err)) => {
                tracing::warn!(lock = %lock.id(), "Failed to encode terrain status: {err}");
            }
            None => self.visit_lock(lock),
        }
    }
}

/// One combat zone.
#[derive(Debug)]
pub struct Zone {
    name: String,
    units: BTreeMap<EntityId, ZoneUnit>,
    engagements: Vec<Engagement>,
    terrain_locks: Vec<Lock>,
    workers: Vec<DamageWorker>,
    runtime: Handle,
    kill_reports: UnboundedReceiver<EntityId>,
    kills: Vec<EntityId>,
    tick: u64,
}

impl Zone {
    /// Build a zone from a scenario. Damage workers run on `runtime`.
    ///
    /// The tick methods block on `runtime` to reap workers, so they must be
    /// called from a thread outside it.
    pub fn from_scenario(scenario: &ScenarioData, runtime: Handle) -> Result<Self> {
        scenario.validate()?;

        let (kill_sender, kill_reports) = unbounded_channel();
        let units = scenario
            .units
            .iter()
            .map(|data| {
                let unit = Arc::new(data.to_unit());
                let processor = DamageProcessor::new(Arc::clone(&unit), runtime.clone());
                processor.set_damage_taken_handler(damage_handler(unit, kill_sender.clone()));
                let zone_unit = ZoneUnit {
                    name: data.name.clone(),
                    team: data.team,
                    core_recharge: data.core_recharge,
                    processor,
                };
                (data.id, zone_unit)
            })
            .collect();

        Ok(Self {
            name: scenario.name.clone(),
            units,
            engagements: scenario.engagements.iter().map(Engagement::new).collect(),
            terrain_locks: scenario.terrain_locks.iter().map(terrain_lock).collect(),
            workers: Vec::new(),
            runtime,
            kill_reports,
            kills: Vec::new(),
            tick: 0,
        })
    }

    /// Zone name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// A unit of this zone.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Arc<Unit>> {
        self.units.get(&id).map(ZoneUnit::unit)
    }

    /// Damage processor of a unit.
    #[must_use]
    pub fn processor(&self, id: EntityId) -> Option<&DamageProcessor> {
        self.units.get(&id).map(|zone_unit| &zone_unit.processor)
    }

    /// Damage workers not yet reaped.
    #[must_use]
    pub fn pending_workers(&self) -> usize {
        self.workers.len()
    }

    /// Units destroyed so far, in report order.
    #[must_use]
    pub fn kills(&self) -> &[EntityId] {
        &self.kills
    }

    /// Replace a unit's fitted modules and drop its cached shield.
    pub fn refit(&self, id: EntityId, modules: Vec<Module>) -> Result<()> {
        let zone_unit = self.units.get(&id).ok_or(CombatError::EntityNotFound(id))?;
        zone_unit.unit().fit_modules(modules);
        zone_unit.processor.invalidate_shield_cache();
        tracing::debug!(unit = id, name = %zone_unit.name, "Unit refitted");
        Ok(())
    }

    /// Whether at most one team still has live units.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let teams: BTreeSet<u32> = self
            .units
            .values()
            .filter(|zone_unit| zone_unit.unit().is_active())
            .map(|zone_unit| zone_unit.team)
            .collect();
        teams.len() <= 1
    }

    /// Advance the zone by `elapsed`.
    ///
    /// Returns the fault of the first reaped worker that panicked.
    pub fn tick(&mut self, elapsed: Duration) -> Result<TickReport> {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        self.recharge(elapsed);
        self.collect_kills(&mut report);
        self.update_engagements(elapsed, &mut report);
        self.update_terrain_locks(elapsed, &mut report);
        self.update_blobs(elapsed);
        self.reap_workers()?;

        Ok(report)
    }

    /// Tick until settled or `max_ticks` is reached, then wait for every
    /// outstanding worker.
    ///
    /// With `realtime` set, sleeps out the rest of each tick.
    pub fn run(
        &mut self,
        tick_length: Duration,
        max_ticks: Option<u64>,
        realtime: bool,
    ) -> Result<ZoneSummary> {
        tracing::info!(zone = %self.name, units = self.units.len(), "Zone started");

        while !self.is_settled() && !max_ticks.is_some_and(|max| self.tick >= max) {
            let started = Instant::now();
            let report = self.tick(tick_length)?;
            if report.shots > 0 || report.locks_completed > 0 || !report.kills.is_empty() {
                tracing::debug!(
                    tick = report.tick,
                    shots = report.shots,
                    locks = report.locks_completed,
                    kills = report.kills.len(),
                    "Tick"
                );
            }

            if realtime {
                if let Some(rest) = tick_length.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }

        self.drain_workers()?;
        self.collect_kills(&mut TickReport::default());

        let summary = self.summary();
        tracing::info!(
            zone = %self.name,
            ticks = summary.ticks,
            kills = summary.kills.len(),
            survivors = summary.survivors.len(),
            "Zone stopped"
        );
        Ok(summary)
    }

    /// Wait for every outstanding worker.
    pub fn drain_workers(&mut self) -> Result<()> {
        for worker in std::mem::take(&mut self.workers) {
            self.runtime.block_on(worker.join())?;
        }
        Ok(())
    }

    /// Current outcome.
    #[must_use]
    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            ticks: self.tick,
            kills: self.kills.clone(),
            survivors: self
                .units
                .iter()
                .filter(|(_, zone_unit)| !zone_unit.unit().flags().dead)
                .map(|(id, _)| *id)
                .collect(),
        }
    }

    // =========================================================================
    // Tick stages
    // =========================================================================

    fn recharge(&self, elapsed: Duration) {
        let seconds = elapsed.as_secs_f64();
        for zone_unit in self.units.values() {
            if zone_unit.core_recharge > 0.0 && zone_unit.unit().is_active() {
                zone_unit
                    .unit()
                    .recharge_core(zone_unit.core_recharge * seconds);
            }
        }
    }

    fn collect_kills(&mut self, report: &mut TickReport) {
        while let Ok(id) = self.kill_reports.try_recv() {
            for engagement in self.engagements.iter_mut().filter(|e| e.involves(id)) {
                engagement.cancel();
            }
            for lock in self.terrain_locks.iter_mut().filter(|l| l.owner() == id) {
                lock.cancel();
            }
            self.kills.push(id);
            report.kills.push(id);
        }
    }

    fn update_engagements(&mut self, elapsed: Duration, report: &mut TickReport) {
        for engagement in &mut self.engagements {
            let Some(target_id) = engagement.lock.unit_target() else {
                continue;
            };
            let (Some(attacker), Some(target)) = (
                self.units.get(&engagement.lock.owner()),
                self.units.get(&target_id),
            ) else {
                continue;
            };
            if !attacker.unit().is_active() || !target.unit().is_active() {
                continue;
            }

            if engagement.lock.state() == LockState::Disabled {
                engagement.lock.start(engagement.lock_time);
            }
            let was_locked = engagement.lock.is_locked();
            engagement.lock.update(elapsed);
            if !engagement.lock.is_locked() {
                continue;
            }
            if !was_locked {
                report.locks_completed += 1;
                engagement.lock.accept(&mut CompletionLog);
            }

            engagement.cooldown = engagement.cooldown.saturating_sub(elapsed);
            if !engagement.cooldown.is_zero() {
                continue;
            }
            engagement.cooldown = engagement.cycle;

            let shot = engagement.penalised_shot(attacker.unit());
            if let Some(worker) = target.processor.submit(shot) {
                self.workers.push(worker);
            }
            report.shots += 1;
        }
    }

    fn update_terrain_locks(&mut self, elapsed: Duration, report: &mut TickReport) {
        for lock in &mut self.terrain_locks {
            let was_locked = lock.is_locked();
            lock.update(elapsed);
            if !was_locked && lock.is_locked() {
                report.locks_completed += 1;
                lock.accept(&mut CompletionLog);
            }
        }
    }

    /// Brute-force hostile query: every unit against every unit of another
    /// team.
    fn update_blobs(&self, elapsed: Duration) {
        for (id, owner) in &self.units {
            let owner_unit = owner.unit();
            if owner_unit.is_active() {
                let here = owner_unit.position();
                for (other_id, candidate) in &self.units {
                    if other_id != id && candidate.team != owner.team {
                        owner_unit.blob().evaluate(here, candidate.unit());
                    }
                }
            }
            owner_unit.blob().tick(elapsed);
        }
    }

    fn reap_workers(&mut self) -> Result<()> {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.workers)
            .into_iter()
            .partition(DamageWorker::is_finished);
        self.workers = running;

        for worker in finished {
            self.runtime.block_on(worker.join())?;
        }
        Ok(())
    }
}
