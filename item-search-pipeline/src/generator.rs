//! Sample items.
//!
//! Used to fill an index for manual testing and by the CLI's sample
//! commands.

use item_search_shared::datetime::shift_date;
use item_search_shared::ItemDocument;

/// Price of every generated item.
pub const SAMPLE_PRICE: f64 = 56.70;

/// Image URL of every generated item.
pub const SAMPLE_IMAGE: &str = "http://product.dangdang.com/26915070.html";

/// Generate `count` items with ids starting at `start_id`.
///
/// Item `id` is created `id + 1` days before `base`, so creation times
/// strictly decrease along the sequence. If `base` cannot be parsed the items
/// have no creation time.
pub fn generate_items(start_id: i64, count: usize, base: &str) -> Vec<ItemDocument> {
    (0..count)
        .map(|n| {
            let id = start_id + n as i64;
            let create_time = shift_date(base, -(id + 1))
                .map(|dt| dt.and_utc().timestamp_millis());

            ItemDocument::new(id)
                .with_title(format!("{id}美国对留学生签证“一刀切”并没变！韩国学生：荒唐到无话可说"))
                .with_category(format!("{id}美国入境和海关执法局发布留学生签证通告"))
                .with_brand(format!("{id}李舰"))
                .with_price(SAMPLE_PRICE)
                .with_images(SAMPLE_IMAGE)
                .with_create_time(create_time)
        })
        .collect()
}

/// The five catalogue items indexed one by one in demos, created at `now`.
pub fn demo_items(now: i64) -> Vec<ItemDocument> {
    let item = |id: i64, title: &str, category: &str, brand: &str, price: f64, images: &str| {
        ItemDocument::new(id)
            .with_title(title)
            .with_category(category)
            .with_brand(brand)
            .with_price(price)
            .with_images(images)
            .with_create_time(Some(now))
    };

    vec![
        item(1, "MacBook Pro", "笔记本电脑", "苹果", 12999.0, "https://www.apple.com/mac.png"),
        item(
            2,
            "重构 改善既有代码的设计",
            "程序设计",
            "马丁·福勒(Martin Fowler)",
            118.00,
            "http://product.dangdang.com/26913154.html",
        ),
        item(
            3,
            "Python编程 从入门到实践",
            "Python",
            "埃里克·马瑟斯（Eric Matthes）",
            61.40,
            "http://bang.dangdang.com/books/bestsellers/01.54.00.00.00.00-recent7-0-0-1-1",
        ),
        item(
            4,
            "统计之美：人工智能时代的科学思维",
            "数学",
            "李舰",
            56.70,
            "http://product.dangdang.com/26915070.html",
        ),
        item(5, "机器学习", "人工智能", "周志华", 61.60, "http://product.dangdang.com/23898620.html"),
    ]
}
