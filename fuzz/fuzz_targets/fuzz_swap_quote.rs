use arbitrary::Arbitrary;
use honggfuzz::fuzz;
use launch_curve::state::TradeDirection;
use launch_curve::testing::sample_config;
use launch_curve::{get_swap_quote, CurveConfig, PoolState, SwapMode, SwapQuoteRequest};

#[derive(Debug, Clone, Arbitrary)]
enum ModeInput {
    ExactIn(u64),
    PartialFill(u64),
    ExactOut(u64),
}

#[derive(Debug, Clone, Arbitrary)]
struct QuoteInput {
    base_to_quote: bool,
    mode: ModeInput,
    // Position of the snapshot price between the start and migration prices, in 1/65535
    price_position: u16,
    slippage_bps: u16,
    has_referral: bool,
    current_point: u32,
}

fn snapshot(config: &CurveConfig, position: u16) -> PoolState {
    let mut pool = PoolState::new(config, 0);
    let span = config.migration_sqrt_price - config.sqrt_start_price;
    pool.sqrt_price = config.sqrt_start_price + span / u16::MAX as u128 * position as u128;
    pool
}

fn fuzz_quote(config: &CurveConfig, input: QuoteInput) {
    let pool = snapshot(config, input.price_position);
    let trade_direction = if input.base_to_quote {
        TradeDirection::BaseToQuote
    } else {
        TradeDirection::QuoteToBase
    };
    let swap_mode = match input.mode {
        ModeInput::ExactIn(amount_in) => SwapMode::ExactIn { amount_in },
        ModeInput::PartialFill(amount_in) => SwapMode::PartialFill { amount_in },
        ModeInput::ExactOut(amount_out) => SwapMode::ExactOut { amount_out },
    };
    let request = SwapQuoteRequest {
        trade_direction,
        swap_mode,
        slippage_bps: input.slippage_bps % 10_001,
        has_referral: input.has_referral,
        current_point: input.current_point as u64,
    };

    let Ok(quote) = get_swap_quote(config, &pool, &request) else {
        return;
    };

    // The price only moves in the trade's direction and never past the curve's ends
    match trade_direction {
        TradeDirection::QuoteToBase => {
            assert!(quote.next_sqrt_price >= pool.sqrt_price);
            let top = config.curve.last().map_or(pool.sqrt_price, |point| point.sqrt_price);
            assert!(quote.next_sqrt_price <= top);
        }
        TradeDirection::BaseToQuote => {
            assert!(quote.next_sqrt_price <= pool.sqrt_price);
            assert!(quote.next_sqrt_price >= config.sqrt_start_price);
        }
    }

    match swap_mode {
        SwapMode::ExactIn { amount_in } => {
            assert_eq!(quote.amount_in, amount_in);
            assert!(!quote.is_partial_fill);
        }
        SwapMode::PartialFill { amount_in } => assert!(quote.amount_in <= amount_in),
        SwapMode::ExactOut { amount_out } => assert!(quote.output_amount >= amount_out),
    }
}

fn main() {
    let config = sample_config();
    loop {
        fuzz!(|data: QuoteInput| {
            fuzz_quote(&config, data);
        });
    }
}
