use html::Node;

/// State of a prev/next pager widget.
///
/// Navigation methods return the page the caller should load; the caller
/// reports back through [`Pager::set_page`] once it has.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pager {
    select_mode: bool,
    hide_when_empty: bool,
    cur_page: u32,
    max_page: u32,
    prev_enabled: bool,
    next_enabled: bool,
    hidden: bool,
}

impl Pager {
    /// `select_mode` adds a page input and a known page count.
    pub fn new(select_mode: bool, hide_when_empty: bool) -> Self {
        let mut pager = Self {
            select_mode,
            hide_when_empty,
            cur_page: 1,
            max_page: 1,
            prev_enabled: false,
            next_enabled: false,
            hidden: false,
        };
        pager.set_page(1);
        if select_mode {
            pager.set_max_page(1);
        }
        pager
    }

    pub fn cur_page(&self) -> u32 {
        self.cur_page
    }

    pub fn max_page(&self) -> u32 {
        self.max_page
    }

    pub fn prev_enabled(&self) -> bool {
        self.prev_enabled
    }

    pub fn next_enabled(&self) -> bool {
        self.next_enabled
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_page(&mut self, page: u32) {
        self.cur_page = page;
        self.prev_enabled = page > 1;
        if self.select_mode {
            self.next_enabled = page < self.max_page;
        }
    }

    pub fn set_max_page(&mut self, max_page: u32) {
        self.max_page = max_page;
        if self.hide_when_empty {
            self.hidden = max_page < 2;
        }
        self.next_enabled = self.cur_page < max_page;
    }

    /// Without select mode the caller decides whether more pages exist.
    pub fn toggle_next(&mut self, enabled: bool) {
        self.next_enabled = enabled;
    }

    pub fn prev(&self) -> Option<u32> {
        (self.cur_page > 1).then(|| self.cur_page - 1)
    }

    pub fn next(&self) -> Option<u32> {
        let more = if self.select_mode {
            self.cur_page < self.max_page
        } else {
            self.next_enabled
        };
        more.then(|| self.cur_page + 1)
    }

    /// Enter pressed in the page box.
    pub fn submit_input(&mut self, text: &str) -> Option<u32> {
        if !self.select_mode {
            return None;
        }
        let page = parse_leading_int(text)?;
        let page = page.clamp(1, i64::from(self.max_page.max(1))) as u32;
        if page != self.cur_page {
            Some(page)
        } else {
            self.set_page(page);
            None
        }
    }

    pub fn render(&self) -> Node {
        let arrow = |class: &str, icon: &str, enabled: bool| {
            let class = if enabled {
                class.to_string()
            } else {
                format!("{class} disabled")
            };
            Node::element("li")
                .with_attr("class", &class)
                .with_child(Node::element("a").with_child(Node::element("span").with_attr("class", icon)))
        };

        let mut mid = Node::element("li")
            .with_attr("class", "pager-mid")
            .with_child(Node::text("Page "));
        mid = if self.select_mode {
            mid.with_child(
                Node::element("input")
                    .with_attr("class", "pager-cur")
                    .with_attr("type", "text")
                    .with_attr("value", &self.cur_page.to_string()),
            )
            .with_child(Node::text(" of "))
            .with_child(Node::element("span").with_attr("class", "pager-total").with_child(Node::text(self.max_page.to_string())))
        } else {
            mid.with_child(Node::element("span").with_attr("class", "pager-cur").with_child(Node::text(self.cur_page.to_string())))
        };

        let mut holder = Node::element("div").with_attr("class", "btr-pager-holder");
        if self.hidden {
            holder = holder.with_attr("style", "display:none");
        }
        holder.with_child(
            Node::element("ul")
                .with_attr("class", "pager")
                .with_child(arrow("pager-prev", "icon-left", self.prev_enabled))
                .with_child(mid)
                .with_child(arrow("pager-next", "icon-right", self.next_enabled)),
        )
    }
}

// parseInt: optional sign, then digits; trailing junk ignored.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}
