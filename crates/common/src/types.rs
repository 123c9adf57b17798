use crate::errors::MarketError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Returns the price only when it is present and strictly positive.
///
/// Quotes coming from real tickers frequently carry `None` or zero in the
/// bid/ask fields; both mean "no usable price on this side".
pub fn positive(price: Option<Decimal>) -> Option<Decimal> {
    price.filter(|p| *p > Decimal::ZERO)
}

/// A trading pair such as `BTC/USDT`.
///
/// Parsed from its `base/quote` string form; both legs are upper-cased on
/// construction so symbols compare consistently across venues.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    pub base: String,
    pub quote: String,
}

impl Symbol {
    pub fn new(base: &str, quote: &str) -> Self {
        Symbol {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Symbol {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 3 || s.len() > 20 {
            return Err(MarketError::MalformedRecord(format!(
                "symbol '{s}' has invalid length"
            )));
        }
        let (base, quote) = s
            .split_once('/')
            .ok_or_else(|| MarketError::MalformedRecord(format!("symbol '{s}' missing '/'")))?;
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return Err(MarketError::MalformedRecord(format!(
                "symbol '{s}' is not of the form base/quote"
            )));
        }
        Ok(Symbol::new(base, quote))
    }
}

impl TryFrom<String> for Symbol {
    type Error = MarketError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

/// Record types the collector validates before they reach the analyzer.
pub trait Validate {
    fn validate(&self) -> Result<(), MarketError>;
}

/// A normalized price/liquidity snapshot for one symbol on one market.
///
/// CEX tickers populate bid/ask/spot and order-book depth; DEX aggregator
/// records carry their price in `spot_price` and a value-locked or volume
/// proxy in `liquidity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub exchange: String,
    pub symbol: Symbol,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub spot_price: Option<Decimal>,
    /// Aggregate volume within the top levels on both sides of the book.
    #[serde(default)]
    pub orderbook_depth: Decimal,
    /// Fractional maker fee, e.g. 0.001 for 0.1%.
    #[serde(default)]
    pub maker_fee: Decimal,
    /// Fractional taker fee.
    #[serde(default)]
    pub taker_fee: Decimal,
    /// Absolute withdrawal fee per network, keyed by network name.
    #[serde(default)]
    pub network_fees: HashMap<String, Decimal>,
    #[serde(default)]
    pub liquidity: Option<Decimal>,
}

impl Quote {
    /// Price at which this market can be bought: ask first, spot as fallback.
    ///
    /// The fallback order is fixed; a zero or negative ask falls through to
    /// the spot price rather than being taken literally.
    pub fn buy_price(&self) -> Option<Decimal> {
        positive(self.ask).or_else(|| positive(self.spot_price))
    }

    /// Price at which this market can be sold: bid first, spot as fallback.
    pub fn sell_price(&self) -> Option<Decimal> {
        positive(self.bid).or_else(|| positive(self.spot_price))
    }
}

impl Validate for Quote {
    fn validate(&self) -> Result<(), MarketError> {
        if self.exchange.is_empty() {
            return Err(MarketError::MalformedRecord(
                "quote missing exchange identifier".to_string(),
            ));
        }
        for (name, price) in [
            ("bid", self.bid),
            ("ask", self.ask),
            ("spot_price", self.spot_price),
        ] {
            if let Some(p) = price {
                if p < Decimal::ZERO {
                    return Err(MarketError::MalformedRecord(format!(
                        "quote {}:{} has negative {name}",
                        self.exchange, self.symbol
                    )));
                }
            }
        }
        if self.orderbook_depth < Decimal::ZERO {
            return Err(MarketError::MalformedRecord(format!(
                "quote {}:{} has negative depth",
                self.exchange, self.symbol
            )));
        }
        Ok(())
    }
}

/// A peer-to-peer fiat marketplace listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P2pQuote {
    pub exchange: String,
    pub asset: String,
    pub fiat: String,
    /// Fiat per unit of asset.
    pub price: Decimal,
    /// Transaction-size bounds, denominated in fiat.
    pub min_limit: Decimal,
    pub max_limit: Decimal,
    /// Whether the counterparty is a verified merchant.
    #[serde(default)]
    pub merchant: bool,
    /// Accepted payment method identifiers.
    #[serde(default)]
    pub payments: Vec<String>,
}

impl Validate for P2pQuote {
    fn validate(&self) -> Result<(), MarketError> {
        if self.exchange.is_empty() || self.asset.is_empty() || self.fiat.is_empty() {
            return Err(MarketError::MalformedRecord(
                "p2p listing missing identifying fields".to_string(),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(MarketError::MalformedRecord(format!(
                "p2p listing {} has negative price",
                self.exchange
            )));
        }
        if self.min_limit > self.max_limit {
            return Err(MarketError::MalformedRecord(format!(
                "p2p listing {} has min_limit > max_limit",
                self.exchange
            )));
        }
        Ok(())
    }
}

/// Which detection strategy produced an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpportunityKind {
    CexCex,
    DexCex,
    P2p,
    Triangle,
}

impl fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            OpportunityKind::CexCex => "cex-cex",
            OpportunityKind::DexCex => "dex-cex",
            OpportunityKind::P2p => "p2p",
            OpportunityKind::Triangle => "triangle",
        };
        write!(f, "{tag}")
    }
}

impl FromStr for OpportunityKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cex-cex" => Ok(OpportunityKind::CexCex),
            "dex-cex" => Ok(OpportunityKind::DexCex),
            "p2p" => Ok(OpportunityKind::P2p),
            "triangle" => Ok(OpportunityKind::Triangle),
            other => Err(MarketError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Coarse profitability bucket derived from the spread magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    High,
    Medium,
    Low,
    Ignore,
}

impl Grade {
    /// Band boundaries are inclusive on the lower bound: >= 5 is high,
    /// >= 2 medium, >= 1 low, anything below is ignore.
    pub fn from_spread(spread_percent: Decimal) -> Self {
        if spread_percent >= Decimal::from(5) {
            Grade::High
        } else if spread_percent >= Decimal::from(2) {
            Grade::Medium
        } else if spread_percent >= Decimal::ONE {
            Grade::Low
        } else {
            Grade::Ignore
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Grade::High => "high",
            Grade::Medium => "medium",
            Grade::Low => "low",
            Grade::Ignore => "ignore",
        };
        write!(f, "{tag}")
    }
}

/// An immutable arbitrage opportunity emitted by the analyzer.
///
/// `fees` is absolute and denominated in the same unit as the prices;
/// `liquidity` is the bottleneck volume across both legs, zero when the
/// strategy defines none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    /// Human-readable path, e.g. `binance -> bybit (BTC/USDT)`.
    pub route: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub fees: Decimal,
    /// Signed; zero or negative means no profit.
    pub spread_percent: Decimal,
    pub liquidity: Decimal,
    pub grade: Grade,
}

impl Opportunity {
    /// Content hash used by the deduplicator to recognize an opportunity
    /// that reappears across scan cycles.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.kind.to_string().as_bytes());
        hasher.update(self.route.as_bytes());
        hasher.update(self.buy_price.to_string().as_bytes());
        hasher.update(self.sell_price.to_string().as_bytes());
        *hasher.finalize().as_bytes()
    }
}
