//! Scripts evaluated in rendered pages.

/// Stealth evasion scripts, applied after the document is ready.
pub(super) const STEALTH_SCRIPTS: &[&str] = &[
    r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    "#,
    r#"
    window.chrome = { runtime: {}, loadTimes: function() {}, csi: function() {}, app: {} };
    "#,
    r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true
    });
    "#,
    r#"
    Object.defineProperty(navigator, 'plugins', {
        get: () => [
            { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format' },
            { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', description: '' }
        ],
        configurable: true
    });
    "#,
];

/// Resolves once the DOM is interactive, or after 10s.
pub(super) const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Scroll to the bottom in viewport steps so lazy-loaded content renders.
/// `{delay}` is replaced with the pause between steps in milliseconds.
pub(super) const SCROLL_SCRIPT: &str = r#"
    new Promise(async (resolve) => {
        const pause = (ms) => new Promise((r) => setTimeout(r, ms));
        let steps = 0;
        while (steps < 40 && window.scrollY + window.innerHeight < document.body.scrollHeight) {
            window.scrollBy(0, window.innerHeight);
            await pause({delay});
            steps += 1;
        }
        window.scrollTo(0, 0);
        resolve(steps);
    })
"#;

/// Remove dialogs, cookie banners and fixed full-screen overlays.
pub(super) const REMOVE_OVERLAYS_SCRIPT: &str = r#"
    (() => {
        let removed = 0;
        const candidates = document.querySelectorAll(
            '[role="dialog"], [aria-modal="true"], [class*="cookie"], [id*="cookie"], [class*="consent"], [class*="modal"], [class*="overlay"], [class*="popup"]'
        );
        for (const el of candidates) {
            const style = window.getComputedStyle(el);
            if (style.position === 'fixed' || style.position === 'sticky' || el.getAttribute('aria-modal') === 'true') {
                el.remove();
                removed += 1;
            }
        }
        for (const el of document.querySelectorAll('body *')) {
            const style = window.getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            if (style.position === 'fixed' && parseInt(style.zIndex || '0', 10) >= 1000
                && rect.width >= window.innerWidth * 0.8 && rect.height >= window.innerHeight * 0.5) {
                el.remove();
                removed += 1;
            }
        }
        document.documentElement.style.overflow = 'auto';
        document.body.style.overflow = 'auto';
        return removed;
    })()
"#;
