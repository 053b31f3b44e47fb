use crate::api::Error;
use crate::model::PoolId;
use scraper::{Html, Selector};

lazy_static! {
    static ref SERIAL_INPUT: Selector = Selector::parse("input[name='serial']").unwrap();
}

/// Extract the pool serial from the "edit my pool" page.
pub fn pool_id(page: &str) -> Result<PoolId, Error> {
    let document = Html::parse_document(page);

    document
        .select(&SERIAL_INPUT)
        .filter_map(|input| input.value().attr("value"))
        .find_map(|value| value.trim().parse::<PoolId>().ok())
        .filter(|id| *id >= 0)
        .ok_or(Error::PoolIdUnavailable)
}
