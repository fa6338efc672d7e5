use crate::model::{Article, Category, CollectionPage, QueryParams};

/// Items the local filter can match against.
pub trait Filterable {
    /// Name of the category the item belongs to, if any.
    fn category_name(&self) -> Option<&str>;

    /// True if any searchable field contains `needle`.
    ///
    /// `needle` is already trimmed and lowercased.
    fn contains_text(&self, needle: &str) -> bool;
}

impl Filterable for Article {
    fn category_name(&self) -> Option<&str> {
        Article::category_name(self)
    }

    fn contains_text(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }
}

impl Filterable for Category {
    fn category_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn contains_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }
}

/// Filter a full collection by category and search text, then cut one page.
///
/// Steps, in order:
/// 1. keep items whose category name equals the category filter (case-insensitive),
///    unless the filter is empty or `"all"`
/// 2. keep items containing the trimmed search text in a searchable field
///    (case-insensitive), unless the search is blank
/// 3. `total` is the count after steps 1 and 2
/// 4. take `limit` items starting at `(page - 1) * limit`, in source order
///
/// A page past the end yields no items but still reports the full `total`.
pub fn filter_and_paginate<T>(collection: &[T], params: &QueryParams) -> CollectionPage<T>
where
    T: Filterable + Clone,
{
    let page = params.page.max(1);
    let limit = params.limit.max(1);

    let category = params.category_filter().map(str::to_lowercase);
    let needle = params.search_filter().map(str::to_lowercase);

    let matches = |item: &&T| -> bool {
        if let Some(wanted) = category.as_deref() {
            let in_category = item
                .category_name()
                .is_some_and(|name| name.to_lowercase() == wanted);
            if !in_category {
                return false;
            }
        }
        match needle.as_deref() {
            Some(needle) => item.contains_text(needle),
            None => true,
        }
    };

    let total = collection.iter().filter(matches).count();
    let offset = (page - 1).saturating_mul(limit);
    let items: Vec<T> = collection
        .iter()
        .filter(matches)
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    CollectionPage {
        items,
        total,
        page,
        limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn category(name: &str) -> Category {
        Category {
            id: format!("cat-{name}"),
            name: name.to_string(),
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn article(id: usize, title: &str, content: &str, category_name: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            user_id: "u1".to_string(),
            category_id: format!("cat-{category_name}"),
            created_at: None,
            updated_at: None,
            category: Some(category(category_name)),
            user: None,
            image_url: None,
            slug: None,
        }
    }

    /// 12 articles: 7 in "tech", 5 in "design". Two titles mention AI.
    fn newsroom() -> Vec<Article> {
        let mut articles = Vec::new();
        for i in 0..7 {
            let title = match i {
                0 => "The Rise of AI in Everyday Life".to_string(),
                3 => "AI pair programming".to_string(),
                _ => format!("Tech story {i}"),
            };
            articles.push(article(i, &title, "body", "tech"));
        }
        for i in 7..12 {
            articles.push(article(i, &format!("Design story {i}"), "layout", "design"));
        }
        articles
    }

    fn ids(page: &CollectionPage<Article>) -> Vec<&str> {
        page.items.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_category_pages() {
        let articles = newsroom();
        let params = QueryParams::new(1, 5).with_category("tech");

        let first = filter_and_paginate(&articles, &params);
        assert_eq!(first.total, 7);
        assert_eq!(ids(&first), vec!["0", "1", "2", "3", "4"]);

        let second = filter_and_paginate(&articles, &params.clone().with_page(2));
        assert_eq!(second.total, 7);
        assert_eq!(ids(&second), vec!["5", "6"]);
    }

    #[test]
    fn test_category_match_ignores_case() {
        let articles = newsroom();
        let page = filter_and_paginate(&articles, &QueryParams::new(1, 20).with_category("DESIGN"));
        assert_eq!(page.total, 5);
    }

    #[test]
    fn test_category_named_all_is_filterable() {
        let articles = vec![
            article(0, "Roundup", "", "All"),
            article(1, "Chips", "", "tech"),
            article(2, "Fonts", "", "design"),
        ];
        let page = filter_and_paginate(&articles, &QueryParams::new(1, 10).with_category("All"));
        assert_eq!(page.total, 1);
        assert_eq!(ids(&page), vec!["0"]);

        let unfiltered = filter_and_paginate(&articles, &QueryParams::new(1, 10).with_category("all"));
        assert_eq!(unfiltered.total, 3);
    }

    #[test]
    fn test_search_with_all_category() {
        let articles = newsroom();
        let page = filter_and_paginate(
            &articles,
            &QueryParams::new(1, 10).with_category("all").with_search("AI"),
        );
        assert_eq!(page.total, 2);
        assert_eq!(ids(&page), vec!["0", "3"]);
    }

    #[test]
    fn test_search_matches_content() {
        let articles = newsroom();
        let page = filter_and_paginate(&articles, &QueryParams::new(1, 10).with_search("LAYOUT"));
        assert_eq!(page.total, 5);
    }

    #[test]
    fn test_search_is_trimmed() {
        let articles = newsroom();
        let padded = filter_and_paginate(&articles, &QueryParams::new(1, 10).with_search("  ai  "));
        assert_eq!(padded.total, 2);

        let blank = filter_and_paginate(&articles, &QueryParams::new(1, 10).with_search("   "));
        assert_eq!(blank.total, 12);
    }

    #[test]
    fn test_category_and_search_combine() {
        let articles = newsroom();
        let page = filter_and_paginate(
            &articles,
            &QueryParams::new(1, 10)
                .with_category("design")
                .with_search("AI"),
        );
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_page_past_end_keeps_total() {
        let articles = newsroom();
        let page = filter_and_paginate(&articles, &QueryParams::new(9, 5).with_category("tech"));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 7);
        assert_eq!(page.page, 9);
    }

    #[test]
    fn test_article_without_category_excluded_by_category_filter() {
        let mut articles = newsroom();
        articles[0].category = None;
        let page = filter_and_paginate(&articles, &QueryParams::new(1, 20).with_category("tech"));
        assert_eq!(page.total, 6);

        let unfiltered = filter_and_paginate(&articles, &QueryParams::new(1, 20));
        assert_eq!(unfiltered.total, 12);
    }

    #[test]
    fn test_categories_search_by_name() {
        let categories = vec![category("Technology"), category("Design"), category("DevOps")];
        let page = filter_and_paginate(&categories, &QueryParams::new(1, 10).with_search("de"));
        let names: Vec<&str> = page.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Design", "DevOps"]);
    }
}
