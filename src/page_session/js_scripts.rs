//! JavaScript evaluated inside crawled pages

/// Installs a `MutationObserver` that records URLs appearing in the DOM after
/// load, plus hooks on `window.open` and the history API.
pub const OBSERVER_SCRIPT: &str = r#"
    (() => {
        if (window.__crawlscopeLinks) {
            return true;
        }
        const links = [];
        window.__crawlscopeLinks = links;
        const record = (value) => {
            if (typeof value === 'string' && value.length > 0) {
                try {
                    links.push(new URL(value, document.baseURI).href);
                } catch (e) {}
            }
        };
        const ATTRS = ['href', 'src', 'action', 'data-url', 'data-href'];
        const scan = (node) => {
            if (!node || node.nodeType !== 1) {
                return;
            }
            ATTRS.forEach(attr => record(node.getAttribute(attr)));
            node.querySelectorAll('[href],[src],[action]').forEach(child => {
                ATTRS.forEach(attr => record(child.getAttribute(attr)));
            });
        };
        const observer = new MutationObserver(mutations => {
            for (const m of mutations) {
                if (m.type === 'attributes') {
                    record(m.target.getAttribute(m.attributeName));
                } else {
                    m.addedNodes.forEach(scan);
                }
            }
        });
        observer.observe(document.documentElement, {
            childList: true,
            subtree: true,
            attributes: true,
            attributeFilter: ATTRS
        });
        window.open = function (url) {
            record(url);
            return null;
        };
        ['pushState', 'replaceState'].forEach(name => {
            const original = history[name];
            history[name] = function (state, title, url) {
                record(url);
                return original.apply(this, arguments);
            };
        });
        window.addEventListener('hashchange', () => record(location.href));
        return true;
    })()
"#;

/// Marks every element carrying an inline event handler or a `javascript:`
/// link and returns how many were marked.
pub const MARK_EVENT_TARGETS_SCRIPT: &str = r#"
    (() => {
        const EVENTS = ['onclick', 'ondblclick', 'onmousedown', 'onmouseup',
            'onmouseover', 'onmouseenter', 'onchange', 'oninput', 'onfocus',
            'onblur', 'onkeydown', 'onkeyup', 'onsubmit'];
        const selector = EVENTS.map(e => '[' + e + ']').join(',') + ',a[href^="javascript:" i]';
        const nodes = Array.from(document.querySelectorAll(selector));
        nodes.forEach((node, i) => node.setAttribute('data-crawlscope-event', String(i)));
        return nodes.length;
    })()
"#;

/// Fires the handlers of the marked element with index `{index}`
pub fn trigger_event_script(index: usize) -> String {
    format!(
        r#"
    (() => {{
        const node = document.querySelector('[data-crawlscope-event="{index}"]');
        if (!node) {{
            return false;
        }}
        for (const attr of Array.from(node.attributes)) {{
            if (!attr.name.startsWith('on')) {{
                continue;
            }}
            try {{
                node.dispatchEvent(new Event(attr.name.slice(2), {{ bubbles: true, cancelable: true }}));
            }} catch (e) {{}}
        }}
        const href = node.getAttribute('href') || '';
        if (href.toLowerCase().startsWith('javascript:')) {{
            try {{
                node.click();
            }} catch (e) {{}}
        }}
        return true;
    }})()
"#
    )
}

/// Returns every link target in the live DOM plus the observer's records
pub const COLLECT_LINKS_SCRIPT: &str = r#"
    (() => {
        const out = [];
        const push = (value) => {
            if (typeof value === 'string' && value.length > 0) {
                out.push(value);
            }
        };
        document.querySelectorAll('a[href], area[href], link[href]').forEach(el => push(el.href));
        document.querySelectorAll('iframe[src], frame[src], script[src], embed[src]').forEach(el => push(el.src));
        document.querySelectorAll('form').forEach(el => push(el.action));
        (window.__crawlscopeLinks || []).forEach(push);
        return out;
    })()
"#;
