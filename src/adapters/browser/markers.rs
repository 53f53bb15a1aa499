//! WhatsApp Web marker catalog: the concrete selectors behind the pluggable
//! detectors. This is the only file that knows what the platform's DOM looks
//! like; a UI change lands here and nowhere else.
//!
//! The chat composer locators explicitly exclude the caption editor via its
//! aria label, so a media overlay never receives the trailing text message.

use crate::ports::{MarkerCatalog, Selector};

const CHAT_COMPOSER_PRIMARY: &str = "//*[@id='main']//footer\
     //div[@contenteditable='true' and @role='textbox' and @data-lexical-editor='true'\
     and not(contains(translate(@aria-label,'CAPTION','caption'),'caption'))\
     and not(contains(translate(@aria-placeholder,'CAPTION','caption'),'caption'))]";

const CHAT_COMPOSER_ANY_MAIN: &str = "//*[@id='main']\
     //div[@contenteditable='true' and @role='textbox' and @data-lexical-editor='true'\
     and not(contains(translate(@aria-label,'CAPTION','caption'),'caption'))\
     and not(contains(translate(@aria-placeholder,'CAPTION','caption'),'caption'))]";

pub const WHATSAPP_WEB: MarkerCatalog = MarkerCatalog {
    base_url: "https://web.whatsapp.com/",

    authenticated: &[
        Selector::Css("div[data-testid='chatlist-panel']"),
        Selector::Css("button[aria-label='New chat']"),
        Selector::Css("div[data-testid='conversation-panel-messages']"),
        Selector::Css("div[role='textbox'][contenteditable='true']"),
        Selector::XPath("//*[@id='pane-side']"),
        Selector::XPath("//*[@id='main']"),
    ],

    login_screen: &[
        Selector::Css("div[data-testid='qrcode']"),
        Selector::Css("canvas[aria-label='Scan this QR code to link a device!']"),
        Selector::XPath("//div[contains(text(),'Log into WhatsApp Web')]"),
    ],

    composer: &[
        Selector::XPath(CHAT_COMPOSER_PRIMARY),
        Selector::XPath(CHAT_COMPOSER_ANY_MAIN),
        Selector::XPath("//div[@contenteditable='true' and @role='textbox']"),
    ],

    invalid_number: &[
        Selector::XPath("//*[contains(text(),'Phone number shared via url is invalid')]"),
        Selector::XPath("//*[contains(text(),\"isn't on WhatsApp\")]"),
    ],

    attach_button: &[
        Selector::XPath("//*[@id='main']/footer/div[1]/div/span/div/div[2]/div/div[1]/button/span"),
        Selector::Css("button[title='Attach']"),
        Selector::Css("div[title='Attach']"),
    ],

    file_input: &[
        Selector::Css("input[type='file']"),
        Selector::XPath("/html/body/div[1]/div/div[1]/span[6]/div/ul/div/div/div[2]/li/div/input"),
    ],

    caption_editor: &[
        Selector::XPath(
            "//div[@role='textbox' and @contenteditable='true' and @data-lexical-editor='true' \
             and @aria-label='Add a caption']",
        ),
        Selector::XPath(
            "//div[contains(@class,'lexical-rich-text-input')]\
             //div[@contenteditable='true' and @role='textbox' and @data-lexical-editor='true']",
        ),
        Selector::XPath(
            "//div[@contenteditable='true' and (@aria-label='Add a caption' \
             or @aria-placeholder='Add a caption') and @role='textbox']",
        ),
    ],

    send_button: &[
        Selector::Css("div[role='button'][aria-label='Send']:not([aria-disabled='true'])"),
        Selector::Css("button[aria-label='Send']:not([aria-disabled='true'])"),
        Selector::Css("div[aria-label='Send']"),
        Selector::Css("button[aria-label='Send']"),
    ],

    delivery_ack: &[
        Selector::Css("span[data-icon='msg-check']"),
        Selector::Css("span[data-icon='msg-dblcheck']"),
    ],
};
