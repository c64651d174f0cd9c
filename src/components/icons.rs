//! Centralized icon definitions.
//!
//! Icon theme is configured in `config.rs` via `ICON_THEME`.
//! This module maps semantic icon names to the selected theme's icons.

use icondata::Icon;

use crate::config::IconTheme;

// =============================================================================
// Theme Imports
// =============================================================================

mod lucide {
    pub use icondata::{
        LuArchive as Archive, LuChevronLeft as ChevronLeft, LuChevronRight as ChevronRight,
        LuChevronsLeft as FirstPage, LuClock as Clock, LuCopy as Copy, LuDownload as Download,
        LuExternalLink as ExternalLink, LuFile as File, LuFilePlus as FilePlus,
        LuFolder as Folder, LuFolderPlus as FolderPlus, LuGlobe as Region, LuHouse as Home,
        LuLayers as Versions, LuLock as Lock, LuPencil as Edit, LuRefreshCw as Refresh,
        LuRotateCcw as Restore, LuTag as Tag, LuTerminal as Terminal, LuTrash2 as Trash,
        LuUpload as Upload, LuUsers as Users, LuX as Close,
    };
}

mod bootstrap {
    pub use icondata::{
        BsArchive as Archive, BsArrowClockwise as Refresh, BsArrowCounterclockwise as Restore,
        BsBoxArrowUpRight as ExternalLink, BsChevronDoubleLeft as FirstPage,
        BsChevronLeft as ChevronLeft, BsChevronRight as ChevronRight, BsClipboard as Copy,
        BsClock as Clock, BsDownload as Download, BsFileEarmark as File,
        BsFileEarmarkPlus as FilePlus, BsFolderFill as Folder, BsFolderPlus as FolderPlus,
        BsGlobe as Region, BsHouseFill as Home, BsLayers as Versions, BsLockFill as Lock,
        BsPencil as Edit, BsPeople as Users, BsTag as Tag, BsTerminal as Terminal,
        BsTrash as Trash, BsUpload as Upload, BsXLg as Close,
    };
}

// =============================================================================
// Icon Constants (selected based on theme)
// =============================================================================

macro_rules! themed_icon {
    ($name:ident, $theme_name:ident) => {
        pub const $name: Icon = match crate::config::ICON_THEME {
            IconTheme::Lucide => lucide::$theme_name,
            IconTheme::Bootstrap => bootstrap::$theme_name,
        };
    };
}

themed_icon!(CHEVRON_LEFT, ChevronLeft);
themed_icon!(CHEVRON_RIGHT, ChevronRight);
themed_icon!(FIRST_PAGE, FirstPage);
themed_icon!(HOME, Home);
themed_icon!(FOLDER, Folder);
themed_icon!(FOLDER_PLUS, FolderPlus);
themed_icon!(FILE, File);
themed_icon!(FILE_PLUS, FilePlus);
themed_icon!(ARCHIVE, Archive);
themed_icon!(CLOCK, Clock);
themed_icon!(RESTORE, Restore);
themed_icon!(REFRESH, Refresh);
themed_icon!(VERSIONS, Versions);
themed_icon!(DOWNLOAD, Download);
themed_icon!(UPLOAD, Upload);
themed_icon!(EDIT, Edit);
themed_icon!(TRASH, Trash);
themed_icon!(TAG, Tag);
themed_icon!(LOCK, Lock);
themed_icon!(CLOSE, Close);
themed_icon!(COPY, Copy);
themed_icon!(EXTERNAL_LINK, ExternalLink);
themed_icon!(REGION, Region);
themed_icon!(TERMINAL, Terminal);
themed_icon!(USERS, Users);
