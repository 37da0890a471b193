const NAVER_SEARCH: &str = "https://search.shopping.naver.com/search/all?query=";
const COUPANG_SEARCH: &str = "https://www.coupang.com/np/search?component=&q=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingLinks {
    pub naver: String,
    pub coupang: String,
}

/// Marketplace search URLs for a card. Plain links, nothing is fetched.
pub fn shopping_links(keyword: &str) -> ShoppingLinks {
    let q = urlencoding::encode(keyword);
    ShoppingLinks {
        naver: format!("{NAVER_SEARCH}{q}"),
        coupang: format!("{COUPANG_SEARCH}{q}"),
    }
}
