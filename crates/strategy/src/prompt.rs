//! Smart-money prompt template.

use common::format_price;

/// Render the analysis prompt for `price`.
///
/// The output depends on nothing but `price`: same input, byte-identical text.
pub fn render_prompt(price: f64) -> String {
    let price = format_price(price);
    format!(
        "
Current BTC price is {price}.

Please evaluate the following:
1. Did price sweep liquidity below key zones recently?
2. Was there a fakeout above resistance or below support?
3. Is there any recent Break of Structure?
4. Is current price retesting a known order block zone?
5. Did volume spike followed by rejection?

Based on smart money concepts and institutional behavior, should we go long or short?
"
    )
}
