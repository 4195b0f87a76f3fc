//! Built-in city list used for search suggestions
//!
//! Selecting a city never checks it against this list; it only backs the
//! search box.

use serde::Serialize;

/// A searchable city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CityInfo {
    /// Display name
    pub name: &'static str,
    /// Province or municipality
    pub province: &'static str,
    /// Romanized name for latin-script search
    pub pinyin: &'static str,
}

const fn city(name: &'static str, province: &'static str, pinyin: &'static str) -> CityInfo {
    CityInfo { name, province, pinyin }
}

/// Cities offered by the search box
pub const CITIES: &[CityInfo] = &[
    city("北京市", "北京", "beijing"),
    city("上海市", "上海", "shanghai"),
    city("广州市", "广东省", "guangzhou"),
    city("深圳市", "广东省", "shenzhen"),
    city("杭州市", "浙江省", "hangzhou"),
    city("南京市", "江苏省", "nanjing"),
    city("苏州市", "江苏省", "suzhou"),
    city("成都市", "四川省", "chengdu"),
    city("重庆市", "重庆", "chongqing"),
    city("武汉市", "湖北省", "wuhan"),
    city("西安市", "陕西省", "xian"),
    city("天津市", "天津", "tianjin"),
    city("长沙市", "湖南省", "changsha"),
    city("郑州市", "河南省", "zhengzhou"),
    city("青岛市", "山东省", "qingdao"),
    city("济南市", "山东省", "jinan"),
    city("厦门市", "福建省", "xiamen"),
    city("福州市", "福建省", "fuzhou"),
    city("昆明市", "云南省", "kunming"),
    city("哈尔滨市", "黑龙江省", "haerbin"),
    city("沈阳市", "辽宁省", "shenyang"),
    city("大连市", "辽宁省", "dalian"),
    city("拉萨市", "西藏自治区", "lasa"),
    city("乌鲁木齐市", "新疆维吾尔自治区", "wulumuqi"),
    city("三亚市", "海南省", "sanya"),
    city("香港", "香港特别行政区", "xianggang"),
];

/// Search the built-in list by name, province, or pinyin
///
/// Matching is a case-insensitive substring match. Blank queries return
/// nothing. At most `limit` results are returned, in list order.
pub fn search_cities(query: &str, limit: usize) -> Vec<CityInfo> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    CITIES
        .iter()
        .filter(|c| {
            c.name.contains(query.as_str())
                || c.province.contains(query.as_str())
                || c.pinyin.contains(query.as_str())
        })
        .take(limit)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_by_name() {
        let results = search_cities("上海", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "上海市");
    }

    #[test]
    fn test_search_by_pinyin_is_case_insensitive() {
        let results = search_cities("BeiJing", 10);
        assert_eq!(results[0].name, "北京市");
    }

    #[test]
    fn test_search_by_province() {
        let results = search_cities("广东", 10);
        let names: Vec<_> = results.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["广州市", "深圳市"]);
    }

    #[test]
    fn test_search_respects_limit() {
        assert_eq!(search_cities("市", 3).len(), 3);
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        assert!(search_cities("   ", 10).is_empty());
    }

    #[test]
    fn test_city_names_are_unique() {
        let mut names: Vec<_> = CITIES.iter().map(|c| c.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CITIES.len());
    }
}
