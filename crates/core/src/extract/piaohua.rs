//! CSS/regex extraction glue for the piaohua movie catalog.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{
    DetailExtractor, DetailFragment, DownloadLink, ListingExtractor, ListingPage, ListingRecord,
    MovieAttributes,
};

static ITEM_SEL: Lazy<Selector> = Lazy::new(|| sel("ul.ul-imgtxt2 li"));
static PIC_LINK_SEL: Lazy<Selector> = Lazy::new(|| sel("div.pic a"));
static PIC_IMG_SEL: Lazy<Selector> = Lazy::new(|| sel("div.pic img"));
static TXT_SEL: Lazy<Selector> = Lazy::new(|| sel("div.txt"));
static H3_SEL: Lazy<Selector> = Lazy::new(|| sel("h3"));
static EM_SEL: Lazy<Selector> = Lazy::new(|| sel("em"));
static P_SEL: Lazy<Selector> = Lazy::new(|| sel("p"));
static SPAN_SEL: Lazy<Selector> = Lazy::new(|| sel("span"));
static PAGES_LINK_SEL: Lazy<Selector> = Lazy::new(|| sel("div.pages a"));
static MAIN_SEL: Lazy<Selector> = Lazy::new(|| sel("div.m-text1"));
static H1_SEL: Lazy<Selector> = Lazy::new(|| sel("h1"));
static INFO_SPAN_SEL: Lazy<Selector> = Lazy::new(|| sel("div.info span"));
static IMG_SEL: Lazy<Selector> = Lazy::new(|| sel("img"));
static BOT_SEL: Lazy<Selector> = Lazy::new(|| sel("div.bot"));
static A_SEL: Lazy<Selector> = Lazy::new(|| sel("a"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static MAGNET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"magnet:\?[^\s<>"']+"#).expect("valid regex"));
static LIST_PAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"list_(\d+)").expect("valid regex"));
static PAGE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"页次：\d+/(\d+)").expect("valid regex"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Extractor for piaohua-style catalog pages: `ul.ul-imgtxt2` listing items,
/// `◎`-keyed attribute lines on detail pages, magnet URIs hiding in bare text.
#[derive(Debug, Default)]
pub struct PiaohuaExtractor;

impl PiaohuaExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_item(item: ElementRef) -> Option<ListingRecord> {
        let mut id = None;
        let mut title = None;
        let mut relative_link = None;
        let mut poster = None;
        let mut quality = None;
        let mut description = None;
        let mut update_date = None;

        if let Some(a) = item.select(&PIC_LINK_SEL).next() {
            if let Some(href) = a.value().attr("href") {
                relative_link = Some(href.to_string());
                // Last path segment minus ".html" is the site-unique id.
                let stem = href
                    .rsplit('/')
                    .next()
                    .unwrap_or("")
                    .trim_end_matches(".html");
                if !stem.is_empty() {
                    id = Some(stem.to_string());
                }
            }
        }

        if let Some(img) = item.select(&PIC_IMG_SEL).next() {
            if let Some(src) = img.value().attr("src") {
                poster = Some(src.to_string());
            }
            if let Some(alt) = img.value().attr("alt") {
                let cleaned = TAG_RE.replace_all(alt, "").trim().to_string();
                if !cleaned.is_empty() {
                    title = Some(cleaned);
                }
            }
        }

        if let Some(txt) = item.select(&TXT_SEL).next() {
            if let Some(h3) = txt.select(&H3_SEL).next() {
                let full = text_of(h3);
                if let Some(em) = h3.select(&EM_SEL).next() {
                    let q = text_of(em);
                    title = Some(full.replace(&q, "").trim().to_string());
                    quality = Some(q);
                } else if !full.is_empty() {
                    title = Some(full);
                }
            }
            if let Some(p) = txt.select(&P_SEL).next() {
                let d = text_of(p);
                if !d.is_empty() {
                    description = Some(d);
                }
            }
            for span in txt.select(&SPAN_SEL) {
                let t = text_of(span);
                if let Some(rest) = t.strip_prefix("更新时间：") {
                    let date = rest.split("点击下载").next().unwrap_or(rest).trim();
                    if !date.is_empty() {
                        update_date = Some(date.to_string());
                    }
                }
            }
        }

        // A record lacking both an id and a title carries nothing to join on.
        if id.is_none() && title.is_none() {
            return None;
        }

        Some(ListingRecord {
            id: id.unwrap_or_default(),
            title: title.unwrap_or_default(),
            relative_link: relative_link.unwrap_or_default(),
            category: String::new(),
            poster,
            quality,
            description,
            update_date,
        })
    }

    /// Page-count fallbacks, tried in fixed order: explicit `页次：x/y`
    /// marker, then the last-page (`尾页`) link, then the max over every
    /// `list_N` link. Pages are not self-describing, so the order stays
    /// exactly as the source site variants expect it.
    fn detect_total_pages(doc: &Html) -> u32 {
        let body_text: String = doc.root_element().text().collect();
        if let Some(caps) = PAGE_MARKER_RE.captures(&body_text) {
            if let Ok(n) = caps[1].parse::<u32>() {
                return n.max(1);
            }
        }

        let mut last_page_link = None;
        let mut max_numeric = None;
        for a in doc.select(&PAGES_LINK_SEL) {
            let href = a.value().attr("href").unwrap_or("");
            let n = LIST_PAGE_RE
                .captures(href)
                .and_then(|c| c[1].parse::<u32>().ok());
            let Some(n) = n else { continue };
            if text_of(a).contains("尾页") {
                last_page_link.get_or_insert(n);
            }
            max_numeric = Some(max_numeric.map_or(n, |m: u32| m.max(n)));
        }

        last_page_link.or(max_numeric).unwrap_or(1)
    }
}

impl ListingExtractor for PiaohuaExtractor {
    fn extract(&self, html: &str, source_url: &str) -> ListingPage {
        let doc = Html::parse_document(html);

        let mut records = Vec::new();
        for item in doc.select(&ITEM_SEL) {
            if let Some(record) = Self::parse_item(item) {
                records.push(record);
            }
        }

        let total_pages = Self::detect_total_pages(&doc);
        debug!(
            source_url,
            records = records.len(),
            total_pages,
            "parsed listing page"
        );

        ListingPage {
            records,
            total_pages,
        }
    }

    fn page_url(&self, base_url: &str, category_path: &str, page: u32) -> String {
        let base = base_url.trim_end_matches('/');
        if page <= 1 {
            format!("{base}/html/{category_path}/index.html")
        } else {
            format!("{base}/html/{category_path}/list_{page}.html")
        }
    }
}

/// Map a `◎`-keyed Chinese attribute line onto the record. Returns true when
/// the key was the cast marker, which switches line collection mode on.
fn apply_attr_line(attrs: &mut MovieAttributes, key: &str, value: String) -> bool {
    let slot = if key.contains("译名") {
        &mut attrs.translated_name
    } else if key.contains("片名") {
        &mut attrs.original_name
    } else if key.contains("年代") {
        &mut attrs.year
    } else if key.contains("产地") {
        &mut attrs.country
    } else if key.contains("类别") {
        &mut attrs.genre
    } else if key.contains("语言") {
        &mut attrs.language
    } else if key.contains("字幕") {
        &mut attrs.subtitles
    } else if key.contains("上映日期") {
        &mut attrs.release_date
    } else if key.contains("IMDb") {
        &mut attrs.imdb_rating
    } else if key.contains("文件格式") {
        &mut attrs.format
    } else if key.contains("视频尺寸") {
        &mut attrs.resolution
    } else if key.contains("文件大小") {
        &mut attrs.file_size
    } else if key.contains("片长") {
        &mut attrs.duration
    } else if key.contains("导演") {
        &mut attrs.director
    } else if key.contains("主演") {
        if !value.is_empty() {
            attrs.cast.push(value);
        }
        return true;
    } else if key.contains("简介") {
        &mut attrs.synopsis
    } else {
        return false;
    };

    if !value.is_empty() {
        *slot = Some(value);
    }
    false
}

#[async_trait::async_trait]
impl DetailExtractor for PiaohuaExtractor {
    async fn extract(&self, html: &str) -> Option<DetailFragment> {
        let doc = Html::parse_document(html);
        let main = doc.select(&MAIN_SEL).next()?;

        let mut attrs = MovieAttributes::default();
        let mut links: Vec<DownloadLink> = Vec::new();

        if let Some(h1) = main.select(&H1_SEL).next() {
            let t = text_of(h1);
            if !t.is_empty() {
                attrs.full_title = Some(t);
            }
        }

        for span in main.select(&INFO_SPAN_SEL) {
            let t = text_of(span);
            if let Some(rest) = t.strip_prefix("发布时间：") {
                let date = rest.trim();
                if !date.is_empty() {
                    attrs.publish_date = Some(date.to_string());
                }
            }
        }

        if let Some(txt) = main.select(&TXT_SEL).next() {
            for (idx, img) in txt.select(&IMG_SEL).enumerate() {
                let Some(src) = img.value().attr("src") else {
                    continue;
                };
                if idx == 0 {
                    attrs.poster_hd = Some(src.to_string());
                } else {
                    attrs.screenshots.push(src.to_string());
                }
            }

            // Attribute lines arrive as separate text nodes between <br>s.
            let mut collecting_cast = false;
            for raw_line in txt.text() {
                let line = raw_line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.contains('◎') {
                    let mut parts = line.splitn(2, '　');
                    let key = parts.next().unwrap_or("").replace('◎', "");
                    let value = parts.next().unwrap_or("").trim().to_string();
                    collecting_cast = apply_attr_line(&mut attrs, key.trim(), value);
                } else if collecting_cast {
                    attrs.cast.push(line.to_string());
                }
            }
        }

        if let Some(bot) = main.select(&BOT_SEL).next() {
            for a in bot.select(&A_SEL) {
                let href = a.value().attr("href").unwrap_or("");
                if href.is_empty() || href.starts_with("javascript") {
                    continue;
                }
                if links.iter().any(|l| l.uri == href) {
                    continue;
                }
                let label = text_of(a);
                links.push(DownloadLink::new(label, href));
            }

            // Magnet URIs dropped in bare text next to the anchors.
            let bot_text: String = bot.text().collect();
            for m in MAGNET_RE.find_iter(&bot_text) {
                let uri = m.as_str();
                if !links.iter().any(|l| l.uri == uri) {
                    links.push(DownloadLink::new("Magnet", uri));
                }
            }
        }

        Some(DetailFragment {
            attributes: attrs,
            download_links: links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::LinkKind;

    // Both extraction traits name their entry point `extract`, so the tests
    // go through the trait to pick one.
    fn parse_listing(html: &str) -> ListingPage {
        ListingExtractor::extract(&PiaohuaExtractor::new(), html, "test://listing")
    }

    async fn parse_detail(html: &str) -> Option<DetailFragment> {
        DetailExtractor::extract(&PiaohuaExtractor::new(), html).await
    }

    const LISTING_PAGE: &str = r#"
        <html><body>
        <ul class="ul-imgtxt2 row">
          <li class="col-md-6">
            <div class="pic"><a href="/html/dongzuo/m101.html"><img src="/p/101.jpg" alt="First Movie"></a></div>
            <div class="txt">
              <h3>First Movie<em>HD</em></h3>
              <p>An action movie.</p>
              <span>更新时间：2024-05-01点击下载</span>
            </div>
          </li>
          <li class="col-md-6">
            <div class="pic"><a href="/html/dongzuo/m102.html"><img src="/p/102.jpg" alt="Second Movie"></a></div>
            <div class="txt"><h3>Second Movie</h3></div>
          </li>
          <li class="col-md-6">
            <div class="txt"><p>no link, no title</p></div>
          </li>
        </ul>
        <div class="pages">
          <a href="index.html">1</a>
          <a href="list_2.html">2</a>
          <a href="list_7.html">尾页</a>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_listing_extract_records() {
        let page = parse_listing(LISTING_PAGE);

        assert_eq!(page.records.len(), 2);
        let first = &page.records[0];
        assert_eq!(first.id, "m101");
        assert_eq!(first.title, "First Movie");
        assert_eq!(first.relative_link, "/html/dongzuo/m101.html");
        assert_eq!(first.quality.as_deref(), Some("HD"));
        assert_eq!(first.description.as_deref(), Some("An action movie."));
        assert_eq!(first.update_date.as_deref(), Some("2024-05-01"));

        let second = &page.records[1];
        assert_eq!(second.id, "m102");
        assert!(second.quality.is_none());
    }

    #[test]
    fn test_listing_drops_record_without_id_and_title() {
        let page = parse_listing(LISTING_PAGE);
        assert!(page.records.iter().all(|r| !r.id.is_empty()));
    }

    #[test]
    fn test_total_pages_last_page_link_wins_over_max() {
        let page = parse_listing(LISTING_PAGE);
        assert_eq!(page.total_pages, 7);
    }

    #[test]
    fn test_total_pages_explicit_marker_takes_precedence() {
        let html = r#"
            <html><body>
            <p>页次：1/12</p>
            <div class="pages"><a href="list_3.html">3</a></div>
            </body></html>
        "#;
        let page = parse_listing(html);
        assert_eq!(page.total_pages, 12);
    }

    #[test]
    fn test_total_pages_max_numeric_fallback() {
        let html = r#"
            <html><body><div class="pages">
            <a href="list_2.html">2</a><a href="list_5.html">5</a><a href="list_3.html">3</a>
            </div></body></html>
        "#;
        let page = parse_listing(html);
        assert_eq!(page.total_pages, 5);
    }

    #[test]
    fn test_total_pages_defaults_to_one() {
        let page = parse_listing("<html><body>nothing</body></html>");
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_page_url_format() {
        let extractor = PiaohuaExtractor::new();
        assert_eq!(
            extractor.page_url("https://example.com", "dongzuo", 1),
            "https://example.com/html/dongzuo/index.html"
        );
        assert_eq!(
            extractor.page_url("https://example.com/", "dongzuo", 3),
            "https://example.com/html/dongzuo/list_3.html"
        );
    }

    const DETAIL_PAGE: &str = r#"
        <html><body><div class="m-text1">
          <h1>First Movie BD1080p</h1>
          <div class="info"><span>发布时间：2024-05-01</span></div>
          <div class="txt">
            <img src="/hd/poster.jpg">
            <img src="/shots/1.jpg">
            ◎译名　首部电影<br>
            ◎年代　2024<br>
            ◎产地　美国<br>
            ◎类别　动作<br>
            ◎主演　Actor One<br>
                 Actor Two<br>
            ◎简介　A fine movie.<br>
          </div>
          <div class="bot">
            <a href="ftp://dl.example.com/first.mkv">FTP 1080p</a>
            <a href="javascript: void(0);">点击复制</a>
            magnet:?xt=urn:btih:deadbeef&dn=first
            <ul><li><a>磁力</a> magnet:?xt=urn:btih:deadbeef&dn=first</li></ul>
          </div>
        </div></body></html>
    "#;

    #[tokio::test]
    async fn test_detail_extracts_attributes_and_links() {
        let fragment = parse_detail(DETAIL_PAGE).await.expect("structured page");

        let attrs = &fragment.attributes;
        assert_eq!(attrs.full_title.as_deref(), Some("First Movie BD1080p"));
        assert_eq!(attrs.publish_date.as_deref(), Some("2024-05-01"));
        assert_eq!(attrs.translated_name.as_deref(), Some("首部电影"));
        assert_eq!(attrs.year.as_deref(), Some("2024"));
        assert_eq!(attrs.country.as_deref(), Some("美国"));
        assert_eq!(attrs.genre.as_deref(), Some("动作"));
        assert_eq!(attrs.cast, vec!["Actor One", "Actor Two"]);
        assert_eq!(attrs.synopsis.as_deref(), Some("A fine movie."));
        assert_eq!(attrs.poster_hd.as_deref(), Some("/hd/poster.jpg"));
        assert_eq!(attrs.screenshots, vec!["/shots/1.jpg"]);

        assert_eq!(fragment.download_links.len(), 2);
        assert_eq!(fragment.download_links[0].kind, LinkKind::Ftp);
        let magnet = &fragment.download_links[1];
        assert_eq!(magnet.kind, LinkKind::Magnet);
        assert!(magnet.uri.starts_with("magnet:?xt=urn:btih:deadbeef"));
    }

    #[tokio::test]
    async fn test_detail_duplicate_magnets_collapse() {
        let fragment = parse_detail(DETAIL_PAGE).await.unwrap();
        let magnets: Vec<_> = fragment
            .download_links
            .iter()
            .filter(|l| l.kind == LinkKind::Magnet)
            .collect();
        assert_eq!(magnets.len(), 1);
    }

    #[tokio::test]
    async fn test_detail_repeated_anchors_collapse_across_the_list() {
        // The same href appears twice with an unrelated link in between.
        let html = r#"
            <div class="m-text1"><h1>Movie</h1>
            <div class="bot">
              <a href="ftp://dl.example.com/a.mkv">FTP</a>
              <a href="magnet:?xt=urn:btih:abc">磁力</a>
              <a href="ftp://dl.example.com/a.mkv">FTP again</a>
            </div></div>
        "#;
        let fragment = parse_detail(html).await.unwrap();
        assert_eq!(fragment.download_links.len(), 2);
        let ftp_count = fragment
            .download_links
            .iter()
            .filter(|l| l.uri == "ftp://dl.example.com/a.mkv")
            .count();
        assert_eq!(ftp_count, 1);
    }

    #[tokio::test]
    async fn test_detail_no_structure_is_soft_failure() {
        let out = parse_detail("<html><body><p>404</p></body></html>").await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_detail_tolerates_malformed_input() {
        let out =
            parse_detail("<div class=\"m-text1\"><h1>Broken</h1><div class=\"txt\">◎<br>◎年代")
                .await
                .unwrap();
        assert_eq!(out.attributes.full_title.as_deref(), Some("Broken"));
        assert!(out.download_links.is_empty());
    }
}
