//! Unit tests for the layer engine.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use eb_core::{EntityId, SimRng};

use crate::{BehaviorDef, EngineError, EngineResult, Hook, Host, Outcome, Value};

// ── Test host ─────────────────────────────────────────────────────────────────

/// Minimal host fake: scripted clock, seeded RNG, flat field map.
struct TestHost {
    now: f64,
    rng: SimRng,
    fields: FxHashMap<(EntityId, &'static str), Value>,
    posted: Vec<(EntityId, &'static str, Vec<Value>)>,
    spawned: Vec<String>,
    killed: Vec<EntityId>,
    next_id: u32,
}

impl TestHost {
    fn new() -> Self {
        Self {
            now: 0.0,
            rng: SimRng::new(7),
            fields: FxHashMap::default(),
            posted: Vec::new(),
            spawned: Vec::new(),
            killed: Vec::new(),
            next_id: 100,
        }
    }
}

impl Host for TestHost {
    fn now(&self) -> f64 {
        self.now
    }

    fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    fn rand_range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo { self.rng.gen_range(lo..hi) } else { lo }
    }

    fn pick(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }

    fn field(&self, entity: EntityId, key: &'static str) -> EngineResult<Value> {
        self.fields
            .get(&(entity, key))
            .copied()
            .ok_or(EngineError::MissingField { entity, key })
    }

    fn set_field(&mut self, entity: EntityId, key: &'static str, value: Value) -> EngineResult<()> {
        self.fields.insert((entity, key), value);
        Ok(())
    }

    fn spawn(&mut self, archetype: &str) -> EngineResult<EntityId> {
        self.spawned.push(archetype.to_string());
        let id = EntityId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn kill(&mut self, entity: EntityId) {
        self.killed.push(entity);
    }

    fn instances_of(&self, _archetype: &str) -> Vec<EntityId> {
        Vec::new()
    }

    fn tagged(&self, _tag: &str, _value: &str) -> Vec<EntityId> {
        Vec::new()
    }

    fn tag_value(&self, _entity: EntityId, _tag: &str) -> Option<&'static str> {
        None
    }

    fn post(&mut self, to: EntityId, message: &'static str, args: Vec<Value>) {
        self.posted.push((to, message, args));
    }
}

type CallLog = Arc<Mutex<Vec<&'static str>>>;

fn log_of(log: &CallLog) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

const ENT: EntityId = EntityId(1);

// ── Builder validation ────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn empty_def_builds() {
        let def = BehaviorDef::builder("husk").build().unwrap();
        assert_eq!(def.name(), "husk");
        assert_eq!(def.layer_count(), 0);
    }

    #[test]
    fn duplicate_layer_name_is_rejected() {
        let result = BehaviorDef::builder("bad")
            .overlay("glow", |_| {})
            .overlay("glow", |_| {})
            .build();
        assert!(matches!(result, Err(EngineError::Definition(_))));
    }

    #[test]
    fn two_defaults_in_one_group_is_rejected() {
        let result = BehaviorDef::builder("bad")
            .group("mode", |g| {
                g.member_default("a", |_| {});
                g.member_default("b", |_| {});
            })
            .build();
        assert!(matches!(result, Err(EngineError::Definition(_))));
    }

    #[test]
    fn duplicate_field_key_is_rejected() {
        let result = BehaviorDef::builder("bad")
            .overlay("glow", |l| {
                l.field("t", |_| Ok(Value::Num(0.0)));
                l.field("t", |_| Ok(Value::Num(1.0)));
            })
            .build();
        assert!(matches!(result, Err(EngineError::Definition(_))));
    }
}

// ── Exclusive groups ──────────────────────────────────────────────────────────

#[cfg(test)]
mod group_tests {
    use super::*;

    fn two_mode_def() -> BehaviorDef {
        BehaviorDef::builder("walker")
            .group("mode", |g| {
                g.member("flee", |l| {
                    l.field("entered", |ctx| Ok(Value::Num(ctx.now())));
                });
                g.member_default("hunt", |l| {
                    l.field("meals", |_| Ok(Value::Num(0.0)));
                });
            })
            .build()
            .unwrap()
    }

    #[test]
    fn default_member_activates_at_creation() {
        let def = two_mode_def();
        let mut host = TestHost::new();
        let state = def.create_state(&mut host, ENT).unwrap();
        assert!(state.is_current(&def, "mode", "hunt").unwrap());
        assert!(!state.is_current(&def, "mode", "flee").unwrap());
    }

    #[test]
    fn most_recent_enable_wins_and_stays_exclusive() {
        let def = two_mode_def();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        for (target, other) in [("flee", "hunt"), ("hunt", "flee"), ("flee", "hunt")] {
            def.enable(&mut state, &mut host, ENT, "mode", target, &[]).unwrap();
            assert!(state.is_current(&def, "mode", target).unwrap());
            assert!(!state.is_current(&def, "mode", other).unwrap());
        }
    }

    #[test]
    fn reenable_is_idempotent_and_preserves_fields() {
        let def = two_mode_def();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        host.now = 4.0;
        def.enable(&mut state, &mut host, ENT, "mode", "flee", &[]).unwrap();
        assert_eq!(state.peek(&def, "flee", "entered").unwrap(), Value::Num(4.0));

        // Re-enabling at a later time must not re-run the initializer.
        host.now = 9.0;
        def.enable(&mut state, &mut host, ENT, "mode", "flee", &[]).unwrap();
        assert_eq!(state.peek(&def, "flee", "entered").unwrap(), Value::Num(4.0));
    }

    #[test]
    fn switching_releases_fields_and_reenabling_reinitializes() {
        let def = two_mode_def();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        host.now = 4.0;
        def.enable(&mut state, &mut host, ENT, "mode", "flee", &[]).unwrap();
        def.enable(&mut state, &mut host, ENT, "mode", "hunt", &[]).unwrap();

        // Inactive layer fields are gone, not stale.
        assert!(matches!(
            state.peek(&def, "flee", "entered"),
            Err(EngineError::InactiveField { .. })
        ));

        // A fresh activation re-runs the initializer expressions.
        host.now = 20.0;
        def.enable(&mut state, &mut host, ENT, "mode", "flee", &[]).unwrap();
        assert_eq!(state.peek(&def, "flee", "entered").unwrap(), Value::Num(20.0));
    }

    #[test]
    fn disable_leaves_group_empty() {
        let def = two_mode_def();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        def.disable(&mut state, &mut host, ENT, "mode").unwrap();
        assert!(!state.is_current(&def, "mode", "hunt").unwrap());
        assert!(!state.is_current(&def, "mode", "flee").unwrap());
    }

    #[test]
    fn unknown_group_and_member_are_errors() {
        let def = two_mode_def();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        assert!(matches!(
            def.enable(&mut state, &mut host, ENT, "stance", "flee", &[]),
            Err(EngineError::NoSuchGroup { .. })
        ));
        assert!(matches!(
            def.enable(&mut state, &mut host, ENT, "mode", "swim", &[]),
            Err(EngineError::NoSuchLayer { .. })
        ));
    }

    #[test]
    fn on_enter_arity_is_checked() {
        let def = BehaviorDef::builder("carrier")
            .overlay("haul", |l| {
                l.field("cargo", |_| Ok(Value::Nil));
                l.on_enter(1, |ctx, args| {
                    let cargo = args[0];
                    ctx.set("cargo", cargo)
                });
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        assert!(matches!(
            def.enable_overlay(&mut state, &mut host, ENT, "haul", &[]),
            Err(EngineError::InitArity { expected: 1, got: 0, .. })
        ));

        def.enable_overlay(&mut state, &mut host, ENT, "haul", &[Value::Ent(EntityId(9))])
            .unwrap();
        assert_eq!(state.peek(&def, "haul", "cargo").unwrap(), Value::Ent(EntityId(9)));
    }
}

// ── Overlays ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod overlay_tests {
    use super::*;

    #[test]
    fn overlays_stack_independently() {
        let def = BehaviorDef::builder("lamp")
            .overlay("glow", |_| {})
            .overlay("hum", |_| {})
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        def.enable_overlay(&mut state, &mut host, ENT, "glow", &[]).unwrap();
        def.enable_overlay(&mut state, &mut host, ENT, "hum", &[]).unwrap();
        assert!(state.overlay_on(&def, "glow").unwrap());
        assert!(state.overlay_on(&def, "hum").unwrap());

        def.disable_overlay(&mut state, &mut host, ENT, "glow").unwrap();
        assert!(!state.overlay_on(&def, "glow").unwrap());
        assert!(state.overlay_on(&def, "hum").unwrap());
    }

    #[test]
    fn enable_overlay_on_group_member_is_rejected() {
        let def = BehaviorDef::builder("walker")
            .group("mode", |g| {
                g.member_default("hunt", |_| {});
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        assert!(matches!(
            def.enable_overlay(&mut state, &mut host, ENT, "hunt", &[]),
            Err(EngineError::NotAnOverlay { .. })
        ));
    }

    #[test]
    fn double_enable_preserves_overlay_fields() {
        let def = BehaviorDef::builder("lamp")
            .overlay("glow", |l| {
                l.field("since", |ctx| Ok(Value::Num(ctx.now())));
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        host.now = 2.0;
        def.enable_overlay(&mut state, &mut host, ENT, "glow", &[]).unwrap();
        host.now = 6.0;
        def.enable_overlay(&mut state, &mut host, ENT, "glow", &[]).unwrap();
        assert_eq!(state.peek(&def, "glow", "since").unwrap(), Value::Num(2.0));
    }
}

// ── Dispatch chain ────────────────────────────────────────────────────────────

#[cfg(test)]
mod chain_tests {
    use super::*;

    #[test]
    fn unhandled_hook_is_a_noop() {
        let def = BehaviorDef::builder("husk").build().unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        let out = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
        assert_eq!(out, Outcome::UNHANDLED);
    }

    #[test]
    fn base_handler_runs_when_no_layer_wraps() {
        let def = BehaviorDef::builder("counter")
            .on(Hook::Update, |_, _| Ok(Value::Num(1.0)))
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        let out = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
        assert!(out.handled);
        assert_eq!(out.value, Value::Num(1.0));
    }

    #[test]
    fn active_wrap_intercepts_and_continuation_reaches_base() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let base_log = Arc::clone(&log);
        let wrap_log = Arc::clone(&log);

        let def = BehaviorDef::builder("walker")
            .on(Hook::Update, move |_, _| {
                base_log.lock().unwrap().push("base");
                Ok(Value::Num(10.0))
            })
            .overlay("boost", |l| {
                l.wrap(Hook::Update, move |ctx, args| {
                    wrap_log.lock().unwrap().push("boost");
                    let below = ctx.call_base(args)?;
                    Ok(Value::Num(below.value.as_num()? + 1.0))
                });
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        // Overlay off: base only.
        let out = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
        assert_eq!(out.value, Value::Num(10.0));
        assert_eq!(log_of(&log), vec!["base"]);

        // Overlay on: wrap first, continuation into base, result augmented.
        log.lock().unwrap().clear();
        def.enable_overlay(&mut state, &mut host, ENT, "boost", &[]).unwrap();
        let out = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
        assert_eq!(out.value, Value::Num(11.0));
        assert_eq!(log_of(&log), vec!["boost", "base"]);
    }

    #[test]
    fn wrap_without_continuation_replaces_base() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let base_log = Arc::clone(&log);

        let def = BehaviorDef::builder("walker")
            .on(Hook::Update, move |_, _| {
                base_log.lock().unwrap().push("base");
                Ok(Value::Nil)
            })
            .overlay("freeze", |l| {
                l.wrap(Hook::Update, |_, _| Ok(Value::Sym("frozen")));
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        def.enable_overlay(&mut state, &mut host, ENT, "freeze", &[]).unwrap();
        let out = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
        assert_eq!(out.value, Value::Sym("frozen"));
        assert!(log_of(&log).is_empty());
    }

    #[test]
    fn later_declared_overlay_stacks_on_top() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let lower_log = Arc::clone(&log);
        let upper_log = Arc::clone(&log);

        let def = BehaviorDef::builder("lamp")
            .overlay("lower", |l| {
                l.wrap(Hook::Update, move |ctx, args| {
                    lower_log.lock().unwrap().push("lower");
                    ctx.call_base(args)?;
                    Ok(Value::Nil)
                });
            })
            .overlay("upper", |l| {
                l.wrap(Hook::Update, move |ctx, args| {
                    upper_log.lock().unwrap().push("upper");
                    ctx.call_base(args)?;
                    Ok(Value::Nil)
                });
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        // Enable in declaration order, then the reverse; stacking must not
        // depend on enable timing.
        for order in [["lower", "upper"], ["upper", "lower"]] {
            for name in order {
                def.enable_overlay(&mut state, &mut host, ENT, name, &[]).unwrap();
            }
            log.lock().unwrap().clear();
            def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
            assert_eq!(log_of(&log), vec!["upper", "lower"]);
            for name in order {
                def.disable_overlay(&mut state, &mut host, ENT, name).unwrap();
            }
        }
    }

    #[test]
    fn layer_fields_update_across_dispatches() {
        let def = BehaviorDef::builder("counter")
            .overlay("tally", |l| {
                l.field("n", |_| Ok(Value::Num(0.0)));
                l.wrap(Hook::Update, |ctx, _| {
                    let n = ctx.get("n")?.as_num()? + 1.0;
                    ctx.set("n", n)?;
                    Ok(Value::Num(n))
                });
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();
        def.enable_overlay(&mut state, &mut host, ENT, "tally", &[]).unwrap();

        for expected in 1..=3 {
            let out = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
            assert_eq!(out.value, Value::Num(expected as f64));
        }
    }
}

// ── Self-transition ───────────────────────────────────────────────────────────

#[cfg(test)]
mod transition_tests {
    use super::*;

    /// A two-member machine where the first member hands the rest of the
    /// update to the second mid-dispatch once its timer expires.
    fn timed_def() -> BehaviorDef {
        BehaviorDef::builder("walker")
            .group("mode", |g| {
                g.member("flee", |l| {
                    l.field("entered", |ctx| Ok(Value::Num(ctx.now())));
                    l.wrap(Hook::Update, |ctx, args| {
                        let elapsed = ctx.now() - ctx.get("entered")?.as_num()?;
                        if elapsed >= 7.5 {
                            ctx.enable("mode", "hunt", &[])?;
                            return Ok(ctx.redispatch(args)?.value);
                        }
                        Ok(Value::Sym("fleeing"))
                    });
                });
                g.member_default("hunt", |l| {
                    l.wrap(Hook::Update, |_, _| Ok(Value::Sym("hunting")));
                });
            })
            .build()
            .unwrap()
    }

    #[test]
    fn transition_fires_within_the_same_dispatch() {
        let def = timed_def();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();
        def.enable(&mut state, &mut host, ENT, "mode", "flee", &[]).unwrap();

        // Before expiry the old member handles the update.
        host.now = 3.0;
        let out = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
        assert_eq!(out.value, Value::Sym("fleeing"));

        // Past expiry the new member's logic runs inside this same call.
        host.now = 8.0;
        let out = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
        assert_eq!(out.value, Value::Sym("hunting"));
        assert!(state.is_current(&def, "mode", "hunt").unwrap());
    }

    #[test]
    fn transition_cycle_fails_with_handler_loop() {
        let def = BehaviorDef::builder("spinner")
            .group("mode", |g| {
                g.member_default("a", |l| {
                    l.wrap(Hook::Update, |ctx, args| {
                        ctx.enable("mode", "b", &[])?;
                        Ok(ctx.redispatch(args)?.value)
                    });
                });
                g.member("b", |l| {
                    l.wrap(Hook::Update, |ctx, args| {
                        ctx.enable("mode", "a", &[])?;
                        Ok(ctx.redispatch(args)?.value)
                    });
                });
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        let result = def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]);
        assert!(matches!(result, Err(EngineError::HandlerLoop { .. })));
    }
}

// ── Nested sub-engines ────────────────────────────────────────────────────────

#[cfg(test)]
mod nesting_tests {
    use super::*;

    /// hunt (default) carries a nested stance group and a nested overlay.
    fn nested_def(log: &CallLog) -> BehaviorDef {
        let exit_log = Arc::clone(log);
        let inner_exit_log = Arc::clone(log);
        BehaviorDef::builder("walker")
            .group("mode", |g| {
                g.member("flee", |_| {});
                g.member_default("hunt", |l| {
                    l.on_exit(move |_| {
                        exit_log.lock().unwrap().push("hunt-exit");
                        Ok(())
                    });
                    l.group("stance", |g| {
                        g.member_default("stalk", |l| {
                            l.on_exit(move |_| {
                                inner_exit_log.lock().unwrap().push("stalk-exit");
                                Ok(())
                            });
                        });
                        g.member("pounce", |_| {});
                    });
                    l.overlay("hungry", |l| {
                        l.field("meals", |_| Ok(Value::Num(1.0)));
                    });
                });
            })
            .build()
            .unwrap()
    }

    #[test]
    fn nested_default_activates_with_parent() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let def = nested_def(&log);
        let mut host = TestHost::new();
        let state = def.create_state(&mut host, ENT).unwrap();

        assert!(state.is_current(&def, "mode", "hunt").unwrap());
        assert!(state.is_current(&def, "stance", "stalk").unwrap());
    }

    #[test]
    fn nested_layers_unreachable_while_parent_inactive() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let def = nested_def(&log);
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        def.enable(&mut state, &mut host, ENT, "mode", "flee", &[]).unwrap();
        assert!(matches!(
            def.enable(&mut state, &mut host, ENT, "stance", "pounce", &[]),
            Err(EngineError::ParentInactive { .. })
        ));
        assert!(matches!(
            def.enable_overlay(&mut state, &mut host, ENT, "hungry", &[]),
            Err(EngineError::ParentInactive { .. })
        ));
    }

    #[test]
    fn deactivating_parent_tears_down_descendants_first() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let def = nested_def(&log);
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();
        def.enable_overlay(&mut state, &mut host, ENT, "hungry", &[]).unwrap();

        def.enable(&mut state, &mut host, ENT, "mode", "flee", &[]).unwrap();

        // Children down before the parent, and every descendant is gone.
        assert_eq!(log_of(&log), vec!["stalk-exit", "hunt-exit"]);
        assert!(!state.is_current(&def, "stance", "stalk").unwrap());
        assert!(matches!(
            state.peek(&def, "hungry", "meals"),
            Err(EngineError::InactiveField { .. })
        ));

        // Re-entering hunt restores its default stance, not the overlay.
        def.enable(&mut state, &mut host, ENT, "mode", "hunt", &[]).unwrap();
        assert!(state.is_current(&def, "stance", "stalk").unwrap());
        assert!(!state.overlay_on(&def, "hungry").unwrap());
    }

    #[test]
    fn nested_wrap_sits_above_parent_wrap() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let outer_log = Arc::clone(&log);
        let inner_log = Arc::clone(&log);

        let def = BehaviorDef::builder("walker")
            .group("mode", |g| {
                g.member_default("hunt", |l| {
                    l.wrap(Hook::Update, move |ctx, args| {
                        outer_log.lock().unwrap().push("hunt");
                        ctx.call_base(args)?;
                        Ok(Value::Nil)
                    });
                    l.overlay("hungry", |l| {
                        l.wrap(Hook::Update, move |ctx, args| {
                            inner_log.lock().unwrap().push("hungry");
                            ctx.call_base(args)?;
                            Ok(Value::Nil)
                        });
                    });
                });
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();
        def.enable_overlay(&mut state, &mut host, ENT, "hungry", &[]).unwrap();

        def.dispatch(&mut state, &mut host, ENT, Hook::Update, &[]).unwrap();
        assert_eq!(log_of(&log), vec!["hungry", "hunt"]);
    }
}

// ── Lifecycle hooks ───────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[test]
    fn init_dispatch_runs_at_creation() {
        let def = BehaviorDef::builder("walker")
            .on(Hook::Init, |ctx, _| {
                ctx.set_field("born", ctx.now())?;
                Ok(Value::Nil)
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        host.now = 12.5;
        def.create_state(&mut host, ENT).unwrap();
        assert_eq!(host.field(ENT, "born").unwrap(), Value::Num(12.5));
    }

    #[test]
    fn on_exit_sees_fields_before_release() {
        let def = BehaviorDef::builder("carrier")
            .overlay("haul", |l| {
                l.field("cargo", |_| Ok(Value::Ent(EntityId(9))));
                l.on_exit(|ctx| {
                    // Stash the cargo in the field store while it is still
                    // readable.
                    let cargo = ctx.get("cargo")?;
                    ctx.set_field("dropped", cargo)
                });
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        def.enable_overlay(&mut state, &mut host, ENT, "haul", &[]).unwrap();
        def.disable_overlay(&mut state, &mut host, ENT, "haul").unwrap();
        assert_eq!(host.field(ENT, "dropped").unwrap(), Value::Ent(EntityId(9)));
    }

    #[test]
    fn field_initializers_read_base_fields() {
        let def = BehaviorDef::builder("walker")
            .overlay("echo", |l| {
                l.field("start", |ctx| ctx.field("pos"));
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        host.set_field(ENT, "pos", Value::Num(3.0)).unwrap();
        let mut state = def.create_state(&mut host, ENT).unwrap();

        def.enable_overlay(&mut state, &mut host, ENT, "echo", &[]).unwrap();
        assert_eq!(state.peek(&def, "echo", "start").unwrap(), Value::Num(3.0));
    }

    #[test]
    fn static_update_runs_against_the_host() {
        let def = BehaviorDef::builder("flock")
            .static_update(|host| {
                host.set_field(EntityId(0), "flock_tick", Value::Bool(true))?;
                Ok(())
            })
            .build()
            .unwrap();
        let mut host = TestHost::new();
        def.run_static_update(&mut host).unwrap();
        assert_eq!(host.field(EntityId(0), "flock_tick").unwrap(), Value::Bool(true));
    }
}
