//! Worms: the Flee→Hunt machine with its nested Hungry overlay.
//!
//! # State machine
//!
//! ```text
//! mode (exclusive)
//! ├── flee            run in one random direction for FLEE_FOR seconds,
//! │                   then self-transition to hunt mid-update
//! └── hunt (default)  chase the closest morsel; idle-wander when none
//!     └── hungry      (overlay) entered on first predation; starves after
//!                     STARVE_AFTER seconds without a refresh, spawning
//!                     eaten + 1 replacement worms told to flee
//! ```
//!
//! Base behavior is bob-delta wandering; flee and hunt replace it, hunt
//! falls back to it when there is nothing to chase.  The `prev_t` base
//! field is the shared frame timestamp: every update path writes it, so
//! bob deltas always span exactly the time since the last update.

use eb_core::{EntityId, Vec2};
use eb_engine::{BehaviorDef, Ctx, EngineError, EngineResult, Hook, Value};
use eb_proc::{bob_delta, closest, random_vector};
use eb_sim::Archetype;

/// Seconds a worm flees after being told to, before it turns to hunting.
pub const FLEE_FOR: f64 = 7.5;

/// Seconds a fed worm survives without another meal.
pub const STARVE_AFTER: f64 = 15.0;

/// Flee travel speed, world units per second.
const FLEE_SPEED: f32 = 22.0;

/// Hunt approach speed, world units per second.
const HUNT_SPEED: f32 = 14.0;

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Two bob channels per axis at unrelated frequencies; the deltas compose
/// into drifting, organic idling.
fn wander_delta(seed: f32, t_prev: f32, t_now: f32) -> Vec2 {
    let dx = bob_delta(1.4, 1.9, seed, t_prev, t_now)
        + bob_delta(0.6, 4.7, seed + 31.0, t_prev, t_now);
    let dy = bob_delta(1.1, 2.3, seed + 57.0, t_prev, t_now)
        + bob_delta(0.5, 5.3, seed + 86.0, t_prev, t_now);
    Vec2::new(dx, dy)
}

fn is_morsel(ctx: &Ctx<'_>, other: EntityId) -> EngineResult<bool> {
    Ok(ctx.host.field(other, "archetype")?.as_sym()? == "morsel")
}

fn morsel_positions(ctx: &Ctx<'_>) -> EngineResult<Vec<(EntityId, Vec2)>> {
    ctx.host
        .instances_of("morsel")
        .into_iter()
        .map(|e| Ok((e, ctx.host.field(e, "pos")?.as_vec2()?)))
        .collect()
}

/// Starvation: replace this worm with `eaten + 1` fresh ones, each told to
/// scatter, then remove it.
fn starve(ctx: &mut Ctx<'_>) -> EngineResult<()> {
    let eaten = ctx.get("eaten")?.as_num()? as u32;
    let pos = ctx.field("pos")?.as_vec2()?;
    for _ in 0..=eaten {
        let child = ctx.host.spawn("worm")?;
        let scatter = random_vector(ctx.host.rng(), 4.0, 12.0);
        ctx.host.set_field(child, "pos", (pos + scatter).into())?;
        ctx.post(child, "flee", vec![]);
    }
    ctx.host.kill(ctx.entity);
    Ok(())
}

// ── Archetypes ────────────────────────────────────────────────────────────────

/// The worm archetype.
pub fn worm_archetype() -> Archetype {
    let def = BehaviorDef::builder("worm")
        .on(Hook::Init, |ctx, _| {
            let seed = ctx.host.rand_range(0.0, 1000.0);
            ctx.set_field("seed", seed)?;
            ctx.set_field("prev_t", ctx.now())?;
            Ok(Value::Nil)
        })
        .on(Hook::Update, |ctx, _| {
            // Idle wandering: apply this frame's bob delta.
            let now = ctx.now();
            let seed = ctx.field("seed")?.as_f32()?;
            let prev = ctx.field("prev_t")?.as_num()? as f32;
            let pos = ctx.field("pos")?.as_vec2()?;
            ctx.set_field("pos", pos + wander_delta(seed, prev, now as f32))?;
            ctx.set_field("prev_t", now)?;
            Ok(Value::Nil)
        })
        .on(Hook::Message, |ctx, args| match args[0].as_sym()? {
            "flee" => {
                ctx.enable("mode", "flee", &[])?;
                Ok(Value::Nil)
            }
            name => Err(EngineError::UnknownMessage { entity: ctx.entity, name }),
        })
        .group("mode", |g| {
            g.member("flee", |l| {
                l.field("dir", |ctx| {
                    Ok(random_vector(ctx.host.rng(), FLEE_SPEED, FLEE_SPEED).into())
                });
                l.field("entered", |ctx| Ok(ctx.now().into()));
                l.wrap(Hook::Update, |ctx, args| {
                    let now = ctx.now();
                    if now - ctx.get("entered")?.as_num()? >= FLEE_FOR {
                        // Hand the rest of this very update to hunt.
                        ctx.enable("mode", "hunt", &[])?;
                        return Ok(ctx.redispatch(args)?.value);
                    }
                    let dt = (now - ctx.field("prev_t")?.as_num()?) as f32;
                    let dir = ctx.get("dir")?.as_vec2()?;
                    let pos = ctx.field("pos")?.as_vec2()?;
                    ctx.set_field("pos", pos + dir.scale(dt))?;
                    ctx.set_field("prev_t", now)?;
                    Ok(Value::Nil)
                });
            });
            g.member_default("hunt", |l| {
                l.wrap(Hook::Update, |ctx, args| {
                    let pos = ctx.field("pos")?.as_vec2()?;
                    let prey = morsel_positions(ctx)?;
                    let Some(target) = closest(pos, prey) else {
                        // Nothing to hunt; fall through to idle wandering.
                        return Ok(ctx.call_base(args)?.value);
                    };

                    let now = ctx.now();
                    let dt = (now - ctx.field("prev_t")?.as_num()?) as f32;
                    let target_pos = ctx.host.field(target, "pos")?.as_vec2()?;
                    let step = HUNT_SPEED * dt;
                    let next = if (target_pos - pos).magn() <= step {
                        target_pos
                    } else {
                        pos + pos.toward(target_pos, step)
                    };
                    ctx.set_field("pos", next)?;
                    ctx.set_field("prev_t", now)?;
                    Ok(Value::Nil)
                });
                l.wrap(Hook::Collision, |ctx, args| {
                    let other = args[0].as_ent()?;
                    if is_morsel(ctx, other)? {
                        // First predation: eat and go hungry.
                        ctx.host.kill(other);
                        ctx.enable_overlay("hungry", &[])?;
                        return Ok(Value::Nil);
                    }
                    Ok(ctx.call_base(args)?.value)
                });
                l.overlay("hungry", |l| {
                    l.field("last_meal", |ctx| Ok(ctx.now().into()));
                    l.field("eaten", |_| Ok(Value::Num(1.0)));
                    l.wrap(Hook::Update, |ctx, args| {
                        if ctx.now() - ctx.get("last_meal")?.as_num()? > STARVE_AFTER {
                            starve(ctx)?;
                            return Ok(Value::Nil);
                        }
                        Ok(ctx.call_base(args)?.value)
                    });
                    l.wrap(Hook::Collision, |ctx, args| {
                        let other = args[0].as_ent()?;
                        if is_morsel(ctx, other)? {
                            // Refresh instead of re-entering the overlay.
                            ctx.host.kill(other);
                            ctx.set("last_meal", ctx.now())?;
                            let eaten = ctx.get("eaten")?.as_num()? + 1.0;
                            ctx.set("eaten", eaten)?;
                            return Ok(Value::Nil);
                        }
                        Ok(ctx.call_base(args)?.value)
                    });
                });
            });
        })
        .build()
        .expect("worm definition is valid");

    Archetype::new(def).field("pos", Vec2::ZERO)
}

/// The morsel archetype: ambient prey that only wanders.
pub fn morsel_archetype() -> Archetype {
    let def = BehaviorDef::builder("morsel")
        .on(Hook::Init, |ctx, _| {
            let seed = ctx.host.rand_range(0.0, 1000.0);
            ctx.set_field("seed", seed)?;
            ctx.set_field("prev_t", ctx.now())?;
            Ok(Value::Nil)
        })
        .on(Hook::Update, |ctx, _| {
            let now = ctx.now();
            let seed = ctx.field("seed")?.as_f32()?;
            let prev = ctx.field("prev_t")?.as_num()? as f32;
            let pos = ctx.field("pos")?.as_vec2()?;
            // Morsels drift at half a worm's sway.
            ctx.set_field("pos", pos + wander_delta(seed, prev, now as f32).scale(0.5))?;
            ctx.set_field("prev_t", now)?;
            Ok(Value::Nil)
        })
        .build()
        .expect("morsel definition is valid");

    Archetype::new(def).field("pos", Vec2::ZERO)
}
