use cosmwasm_std::{Addr, QuerierWrapper, Uint128, Uint256};
use jackpot_common::interfaces::{BoostQueryMsg, BpsResponse};

use crate::state::LotteryConfig;

/// Denominator of every win chance (parts per million).
pub const PPM_DENOMINATOR: u64 = 1_000_000;
/// No configuration may give a single entry better than 10%.
pub const MAX_WIN_CHANCE_CAP_PPM: u32 = 100_000;
/// Trade size (6-decimal USD, $1000) at which odds reach the configured maximum.
pub const SCALE_WINDOW_USD: Uint128 = Uint128::new(1_000_000_000);
/// Personal multipliers are capped at 5x.
pub const MAX_PERSONAL_MULTIPLIER_BPS: u32 = 50_000;

const BPS_DENOMINATOR: u64 = 10_000;
const PPM_PER_BPS: u64 = 100;

/// Boost inputs for one user. `None` means the lookup failed or returned nothing
/// usable, which counts as "no boost" for that stage only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boosts {
    pub multiplier_bps: Option<u32>,
    pub additional_bps: Option<u32>,
}

/// Chance from trade size alone: `base` at or below the minimum, `max` at or
/// beyond the $1000 ceiling, linear in between.
pub fn base_win_chance(cfg: &LotteryConfig, usd_value: Uint128) -> u32 {
    if usd_value <= cfg.min_swap_usd {
        return cfg.base_win_chance_ppm;
    }
    if usd_value >= SCALE_WINDOW_USD || cfg.min_swap_usd >= SCALE_WINDOW_USD {
        return cfg.max_win_chance_ppm;
    }

    let span = (cfg.max_win_chance_ppm - cfg.base_win_chance_ppm) as u128;
    let progressed = (usd_value - cfg.min_swap_usd).u128();
    let window = (SCALE_WINDOW_USD - cfg.min_swap_usd).u128();
    let bonus = progressed * span / window;

    cfg.base_win_chance_ppm + bonus as u32
}

/// Apply the multiplicative stage, then the additive stage, then clamp.
pub fn apply_boosts(cfg: &LotteryConfig, chance_ppm: u32, boosts: &Boosts) -> u32 {
    let mut chance = chance_ppm as u64;

    if let Some(multiplier) = boosts.multiplier_bps {
        if multiplier as u64 > BPS_DENOMINATOR {
            let capped = multiplier.min(MAX_PERSONAL_MULTIPLIER_BPS) as u64;
            chance = chance * capped / BPS_DENOMINATOR;
        }
    }

    if let Some(additional) = boosts.additional_bps {
        chance = chance.saturating_add(additional as u64 * PPM_PER_BPS);
    }

    chance.min(cfg.max_win_chance_ppm as u64) as u32
}

/// Look up both boost stages independently. Any failure collapses to `None`.
pub fn fetch_boosts(querier: &QuerierWrapper, boost_source: Option<&Addr>, user: &Addr) -> Boosts {
    let Some(source) = boost_source else {
        return Boosts::default();
    };

    let multiplier_bps = querier
        .query_wasm_smart::<BpsResponse>(
            source,
            &BoostQueryMsg::PersonalMultiplierBps {
                user: user.to_string(),
            },
        )
        .ok()
        .map(|r| r.bps);

    let additional_bps = querier
        .query_wasm_smart::<BpsResponse>(
            source,
            &BoostQueryMsg::AdditionalProbabilityBps {
                user: user.to_string(),
            },
        )
        .ok()
        .map(|r| r.bps);

    Boosts {
        multiplier_bps,
        additional_bps,
    }
}

/// Full odds for a user: size-based chance with both boost stages applied.
pub fn win_chance(
    querier: &QuerierWrapper,
    cfg: &LotteryConfig,
    boost_source: Option<&Addr>,
    user: &Addr,
    usd_value: Uint128,
) -> u32 {
    let base = base_win_chance(cfg, usd_value);
    let boosts = fetch_boosts(querier, boost_source, user);
    apply_boosts(cfg, base, &boosts)
}

/// Reduce a random word to a draw in `[0, 1_000_000)`.
pub fn draw_ppm(word: Uint256) -> u64 {
    let remainder = word % Uint256::from(PPM_DENOMINATOR);
    let bytes = remainder.to_be_bytes();
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[24..32]);
    u64::from_be_bytes(low)
}

pub fn is_winning_draw(draw: u64, win_chance_ppm: u32) -> bool {
    draw < win_chance_ppm as u64
}
