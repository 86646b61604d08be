//! Waygates: stationary teleporters linked by a shared network tag.
//!
//! A gate idles until a `teleport` message hands it a payload entity.  Its
//! Teleporting overlay then captures the start state — own position, a
//! random sibling gate on the same network, a duration proportional to the
//! distance — and eases the payload across: the gate's glow ramps up and
//! back down with [`settle_blend`], the payload's position follows the
//! smoothstepped transit, and on completion the destination gate receives
//! the payload via a `receive` message while the overlay disables itself.
//!
//! A gate with no sibling on its network still runs the ease (a degenerate
//! zero-length transit) and completes without a handoff; a warning is
//! logged rather than an error raised, so content keeps working in
//! half-built worlds.

use eb_core::Vec2;
use eb_engine::{BehaviorDef, EngineError, Hook, Value};
use eb_proc::{settle_blend, transit_factor};
use eb_sim::Archetype;

/// Transit seconds per world unit of gate separation.
const SECS_PER_UNIT: f64 = 0.05;

/// Shortest allowed transit; keeps both easing ramps meaningful.
const MIN_TRANSIT: f64 = 2.0;

/// Glow level while idle.
const REST_GLOW: f64 = 0.25;

/// Glow level mid-transit.
const TRANSIT_GLOW: f64 = 1.0;

/// A waygate archetype on the given network.
pub fn waygate_archetype(network: &'static str) -> Archetype {
    let def = BehaviorDef::builder("waygate")
        .on(Hook::Message, |ctx, args| match args[0].as_sym()? {
            "teleport" => {
                let payload = args.get(1).copied().unwrap_or(Value::Nil).as_ent()?;
                ctx.enable_overlay("teleporting", &[Value::Ent(payload)])?;
                Ok(Value::Nil)
            }
            "receive" => {
                let payload = args.get(1).copied().unwrap_or(Value::Nil).as_ent()?;
                let here = ctx.field("pos")?;
                ctx.host.set_field(payload, "pos", here)?;
                ctx.set_field("carried", payload)?;
                Ok(Value::Nil)
            }
            name => Err(EngineError::UnknownMessage { entity: ctx.entity, name }),
        })
        .overlay("teleporting", |l| {
            l.field("payload", |_| Ok(Value::Nil));
            l.field("started", |ctx| Ok(ctx.now().into()));
            l.field("from", |ctx| ctx.field("pos"));
            l.field("dest", |_| Ok(Value::Nil));
            l.field("duration", |_| Ok(Value::Num(MIN_TRANSIT)));
            l.on_enter(1, |ctx, args| {
                ctx.set("payload", args[0])?;

                // Pick a random sibling gate on the same network.
                let me = ctx.entity;
                let mut peers = match ctx.host.tag_value(me, "network") {
                    Some(net) => ctx.host.tagged("network", net),
                    None => Vec::new(),
                };
                peers.retain(|&e| e != me);

                match ctx.host.pick(peers.len()) {
                    Some(i) => {
                        let dest = peers[i];
                        let from = ctx.get("from")?.as_vec2()?;
                        let to = ctx.host.field(dest, "pos")?.as_vec2()?;
                        let dist = (to - from).magn() as f64;
                        ctx.set("dest", dest)?;
                        ctx.set("duration", (dist * SECS_PER_UNIT).max(MIN_TRANSIT))?;
                    }
                    None => {
                        // Degenerate transit: ease in place, no handoff.
                        tracing::warn!(entity = %me, "waygate has no network sibling");
                    }
                }
                Ok(())
            });
            l.wrap(Hook::Update, |ctx, _| {
                let elapsed = (ctx.now() - ctx.get("started")?.as_num()?) as f32;
                let duration = ctx.get("duration")?.as_num()? as f32;

                // Glow blends resting ↔ in-transit across the three phases.
                let tn = settle_blend(elapsed, duration) as f64;
                ctx.set_field("glow", REST_GLOW + (TRANSIT_GLOW - REST_GLOW) * tn)?;

                // The payload rides the smoothstepped transit.
                let from = ctx.get("from")?.as_vec2()?;
                let to = match ctx.get("dest")? {
                    Value::Ent(dest) => ctx.host.field(dest, "pos")?.as_vec2()?,
                    _ => from,
                };
                let payload = ctx.get("payload")?.as_ent()?;
                let carried_to = from.lerp(to, transit_factor(elapsed, duration));
                ctx.host.set_field(payload, "pos", carried_to.into())?;

                if elapsed >= duration {
                    // Hand off and wind down.
                    if let Value::Ent(dest) = ctx.get("dest")? {
                        ctx.post(dest, "receive", vec![Value::Ent(payload)]);
                    }
                    ctx.set_field("carried", Value::Nil)?;
                    ctx.disable_overlay("teleporting")?;
                }
                Ok(Value::Nil)
            });
        })
        .build()
        .expect("waygate definition is valid");

    Archetype::new(def)
        .field("pos", Vec2::ZERO)
        .field("glow", REST_GLOW)
        .field("carried", Value::Nil)
        .tag("network", Some(network))
}
