//! Interface C para o etiquetador POS.
//!
//! Três funções espelham o ciclo de vida do [`TaggerHandle`]:
//!
//! ```c
//! PerceptronTagger* t = tagger_create("weights.json", "classes.txt", "tags.json");
//! if (!t) { fprintf(stderr, "erro %d\n", tagger_last_error()); return 1; }
//! const TagResults* r = tagger_annotate(t, "the quick brown fox");
//! for (size_t i = 0; i < r->num_tags; i++) printf("%s %s %f\n", r->tags[i].word, r->tags[i].tag, r->tags[i].conf);
//! tagger_release(t);
//! ```
//!
//! # Posse da memória
//!
//! O ponteiro devolvido por `tagger_annotate` aponta para um buffer **dentro do handle**.
//! Ele vale até a próxima chamada de `tagger_annotate` no mesmo handle ou até
//! `tagger_release`; quem precisar dos dados depois disso deve copiá-los.
//! Um handle não pode ser usado por duas threads ao mesmo tempo; handles distintos sim.
//!
//! Com a feature `java`, o mesmo ciclo de vida é exportado para a classe
//! `pos.tagger.POSTagger` via JNI (veja `java/pos/tagger/POSTagger.java`).

use std::cell::Cell;
use std::ffi::{c_char, c_float, c_int, CStr, CString};
use std::ptr;

use pos_core::TaggerHandle;
use tracing::error;

#[cfg(feature = "java")]
mod java;

/// Sucesso.
pub const TAGGER_OK: c_int = 0;
/// Ponteiro nulo ou string que não é UTF-8 válido.
pub const TAGGER_ERR_INVALID_ARGUMENT: c_int = -1;

thread_local! {
    static LAST_ERROR: Cell<c_int> = const { Cell::new(TAGGER_OK) };
}

fn set_last_error(code: c_int) {
    LAST_ERROR.with(|e| e.set(code));
}

#[repr(C)]
pub struct CTag {
    pub word: *const c_char,
    pub tag: *const c_char,
    pub conf: c_float,
}

#[repr(C)]
pub struct TagResults {
    pub tags: *const CTag,
    pub num_tags: usize,
}

/// Handle opaco visto pelo C.
pub struct PerceptronTagger {
    handle: TaggerHandle,
    /// Donos das strings apontadas por `ctags`.
    strings: Vec<CString>,
    ctags: Vec<CTag>,
    results: TagResults,
}

impl PerceptronTagger {
    fn new(handle: TaggerHandle) -> Self {
        Self {
            handle,
            strings: Vec::new(),
            ctags: Vec::new(),
            results: TagResults {
                tags: ptr::null(),
                num_tags: 0,
            },
        }
    }

    /// Reconstrói a visão C do último resultado. As strings antigas só são liberadas
    /// aqui, então ponteiros entregues antes valem até esta chamada.
    fn refresh(&mut self, sentence: &str) -> &TagResults {
        let tagged = self.handle.annotate(sentence);
        self.ctags.clear();
        self.strings.clear();
        self.strings.reserve(tagged.len() * 2);

        for tw in tagged {
            // Palavras vieram de um CStr, então não têm NUL; rótulos de classe poderiam ter.
            let word = CString::new(tw.word.as_str()).unwrap_or_default();
            let tag = CString::new(tw.tag.as_str()).unwrap_or_default();
            // O buffer de um CString é alocado no heap: mover o CString para o Vec não move os bytes.
            self.ctags.push(CTag {
                word: word.as_ptr(),
                tag: tag.as_ptr(),
                conf: tw.confidence as c_float,
            });
            self.strings.push(word);
            self.strings.push(tag);
        }

        self.results = TagResults {
            tags: if self.ctags.is_empty() { ptr::null() } else { self.ctags.as_ptr() },
            num_tags: self.ctags.len(),
        };
        &self.results
    }
}

/// # Safety
/// `ptr` deve ser nulo ou apontar para uma string C terminada em NUL.
unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Código do último erro nesta thread (`0` se a última chamada teve sucesso).
///
/// Códigos positivos vêm de [`pos_core::LoadErrorKind::code`]:
/// 1 arquivo ausente, 2 erro de leitura, 3 conteúdo malformado,
/// 4 classe não declarada, 5 conjunto de classes vazio, 6 configuração inválida.
#[no_mangle]
pub extern "C" fn tagger_last_error() -> c_int {
    LAST_ERROR.with(|e| e.get())
}

/// Carrega o modelo. Devolve nulo em caso de falha (veja [`tagger_last_error`]).
///
/// # Safety
/// Os três argumentos devem ser nulos ou strings C válidas.
#[no_mangle]
pub unsafe extern "C" fn tagger_create(
    weights_filepath: *const c_char,
    classes_filepath: *const c_char,
    tags_filepath: *const c_char,
) -> *mut PerceptronTagger {
    let (Some(weights), Some(classes), Some(tags)) =
        (c_str(weights_filepath), c_str(classes_filepath), c_str(tags_filepath))
    else {
        set_last_error(TAGGER_ERR_INVALID_ARGUMENT);
        return ptr::null_mut();
    };

    match TaggerHandle::create(weights, tags, classes) {
        Ok(handle) => {
            set_last_error(TAGGER_OK);
            Box::into_raw(Box::new(PerceptronTagger::new(handle)))
        }
        Err(e) => {
            error!(kind = ?e.kind(), "tagger_create: {e}");
            set_last_error(e.kind().code());
            ptr::null_mut()
        }
    }
}

/// Etiqueta uma sentença (tokens separados por espaço).
///
/// Devolve nulo se algum argumento for inválido.
///
/// # Safety
/// `tagger_ptr` deve ter vindo de [`tagger_create`] e ainda não ter sido liberado;
/// `sentence` deve ser uma string C válida.
#[no_mangle]
pub unsafe extern "C" fn tagger_annotate(
    tagger_ptr: *mut PerceptronTagger,
    sentence: *const c_char,
) -> *const TagResults {
    let Some(tagger) = tagger_ptr.as_mut() else {
        set_last_error(TAGGER_ERR_INVALID_ARGUMENT);
        return ptr::null();
    };
    let Some(sentence) = c_str(sentence) else {
        set_last_error(TAGGER_ERR_INVALID_ARGUMENT);
        return ptr::null();
    };
    set_last_error(TAGGER_OK);
    tagger.refresh(sentence) as *const TagResults
}

/// Libera o handle e tudo que ele possui. Aceita nulo.
///
/// # Safety
/// `tagger_ptr` deve ser nulo ou ter vindo de [`tagger_create`], e não pode ser usado depois.
#[no_mangle]
pub unsafe extern "C" fn tagger_release(tagger_ptr: *mut PerceptronTagger) {
    if tagger_ptr.is_null() {
        return;
    }
    let tagger = Box::from_raw(tagger_ptr);
    tagger.handle.release();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn model_files(dir: &std::path::Path) -> (CString, CString, CString) {
        fs::write(
            dir.join("weights.json"),
            r#"{"i word dog": {"NOUN": 3.0}, "i word runs": {"VERB": 3.0}}"#,
        )
        .unwrap();
        fs::write(dir.join("classes.txt"), "NOUN\nVERB\nDET\n").unwrap();
        fs::write(dir.join("tags.json"), r#"{"the": "DET"}"#).unwrap();
        let path = |name: &str| CString::new(dir.join(name).to_str().unwrap()).unwrap();
        (path("weights.json"), path("classes.txt"), path("tags.json"))
    }

    unsafe fn read(results: *const TagResults) -> Vec<(String, String, f32)> {
        let results = &*results;
        (0..results.num_tags)
            .map(|i| {
                let t = &*results.tags.add(i);
                (
                    CStr::from_ptr(t.word).to_str().unwrap().to_string(),
                    CStr::from_ptr(t.tag).to_str().unwrap().to_string(),
                    t.conf,
                )
            })
            .collect()
    }

    #[test]
    fn test_create_annotate_release() {
        let dir = tempfile::tempdir().unwrap();
        let (w, c, t) = model_files(dir.path());
        let sentence = CString::new("the dog runs").unwrap();

        unsafe {
            let tagger = tagger_create(w.as_ptr(), c.as_ptr(), t.as_ptr());
            assert!(!tagger.is_null());
            assert_eq!(tagger_last_error(), TAGGER_OK);

            let tags = read(tagger_annotate(tagger, sentence.as_ptr()));
            assert_eq!(tags.len(), 3);
            assert_eq!((tags[0].0.as_str(), tags[0].1.as_str(), tags[0].2), ("the", "DET", 1.0));
            assert_eq!(tags[1].1, "NOUN");
            assert_eq!(tags[2].1, "VERB");

            // O buffer é reaproveitado na chamada seguinte.
            let empty = CString::new("   ").unwrap();
            let r = tagger_annotate(tagger, empty.as_ptr());
            assert_eq!((*r).num_tags, 0);

            tagger_release(tagger);
        }
    }

    #[test]
    fn test_missing_file_reports_code() {
        let dir = tempfile::tempdir().unwrap();
        let (w, c, _) = model_files(dir.path());
        let missing = CString::new(dir.path().join("nope.json").to_str().unwrap()).unwrap();

        unsafe {
            let tagger = tagger_create(w.as_ptr(), c.as_ptr(), missing.as_ptr());
            assert!(tagger.is_null());
            assert_eq!(tagger_last_error(), pos_core::LoadErrorKind::Missing.code());
        }
    }

    #[test]
    fn test_referential_mismatch_reports_code() {
        let dir = tempfile::tempdir().unwrap();
        let (w, c, t) = model_files(dir.path());
        fs::write(dir.path().join("tags.json"), r#"{"the": "DT"}"#).unwrap();

        unsafe {
            let tagger = tagger_create(w.as_ptr(), c.as_ptr(), t.as_ptr());
            assert!(tagger.is_null());
            assert_eq!(
                tagger_last_error(),
                pos_core::LoadErrorKind::ReferentialMismatch.code()
            );
        }
    }

    #[test]
    fn test_null_arguments() {
        unsafe {
            assert!(tagger_create(ptr::null(), ptr::null(), ptr::null()).is_null());
            assert_eq!(tagger_last_error(), TAGGER_ERR_INVALID_ARGUMENT);
            assert!(tagger_annotate(ptr::null_mut(), ptr::null()).is_null());
            tagger_release(ptr::null_mut());
        }
    }
}
